//! Caller identity. Token checks happen upstream; this module only turns the
//! resulting claim into an owner key.

use std::fmt;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::error::AppError;

/// User id placed in the request extensions by the authentication layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// The resolved owner of every event touched by the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(Uuid);

impl OwnerKey {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn parse(claim: &str) -> Result<Self, AppError> {
        Uuid::parse_str(claim.trim())
            .map(Self)
            .map_err(|_| AppError::Unauthorized("invalid user id".to_string()))
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OwnerKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(AuthenticatedUser(claim)) => OwnerKey::parse(claim),
            None => Err(AppError::Unauthorized("invalid user id".to_string())),
        }
    }
}

/// Copies the user id from the configured gateway header into
/// [`AuthenticatedUser`]. Does nothing when no header is configured.
pub async fn trusted_header_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(header) = &state.config.trusted_user_header {
        let claim = request
            .headers()
            .get(header)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if let Some(claim) = claim {
            request.extensions_mut().insert(AuthenticatedUser(claim));
        }
    }

    next.run(request).await
}
