use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;
use crate::utils::response::error as error_response;

/// The storage call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl StoreOp {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOp::Create => "create",
            StoreOp::List => "list",
            StoreOp::Get => "get",
            StoreOp::Update => "update",
            StoreOp::Delete => "delete",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            StoreOp::Create => "could not create event",
            StoreOp::List => "could not fetch events",
            StoreOp::Get => "could not fetch event",
            StoreOp::Update => "failed to update event",
            StoreOp::Delete => "failed to delete event",
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage error during {operation}")]
    Storage {
        operation: StoreOp,
        #[source]
        source: StoreError,
    },

    #[error("Storage deadline exceeded during {operation}")]
    Timeout { operation: StoreOp },
}

impl AppError {
    pub fn storage(operation: StoreOp) -> impl FnOnce(StoreError) -> Self {
        move |source| AppError::Storage { operation, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Storage { .. } => "STORAGE_ERROR",
            AppError::Timeout { .. } => "TIMEOUT",
        }
    }

    fn log(&self) {
        match self {
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::Storage { operation, source } => {
                error!(error = ?source, operation = operation.as_str(), "Storage error");
            }
            AppError::Timeout { operation } => {
                error!(operation = operation.as_str(), "Storage deadline exceeded");
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Storage { operation, .. } => operation.failure_message().to_string(),
            AppError::Timeout { operation } => {
                format!("{}: deadline exceeded", operation.failure_message())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Storage details stay in the logs.
        error_response(code, self.public_message(), None, status)
    }
}
