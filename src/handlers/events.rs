use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::OwnerKey;
use crate::models::{CreateEventRequest, EventPatch};
use crate::services::events::Conditional;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::acknowledge;

#[derive(Debug, Deserialize)]
pub struct ListEventsParams {
    pub q: Option<String>,
}

pub async fn create_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(bad_body)?;
    let id = state.events.create(owner, request).await?;
    Ok(acknowledge(StatusCode::CREATED, id, "event created"))
}

pub async fn list_events(
    State(state): State<AppState>,
    owner: OwnerKey,
    Query(params): Query<ListEventsParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let outcome = state
        .events
        .list(owner, params.q.as_deref(), if_none_match(&headers))
        .await?;
    Ok(conditional_response(outcome))
}

pub async fn get_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_event_id(&id)?;
    let outcome = state.events.get(owner, id, if_none_match(&headers)).await?;
    Ok(conditional_response(outcome))
}

pub async fn update_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id): Path<String>,
    body: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_event_id(&id)?;
    let Json(patch) = body.map_err(bad_body)?;
    let id = state.events.update(owner, id, patch).await?;
    Ok(acknowledge(StatusCode::OK, id, "event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_event_id(&id)?;
    let id = state.events.delete(owner, id).await?;
    Ok(acknowledge(StatusCode::OK, id, "event deleted"))
}

fn parse_event_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid event id".to_string()))
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

fn if_none_match(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
}

fn conditional_response<T: Serialize>(outcome: Conditional<T>) -> Response {
    match outcome {
        Conditional::Fresh(validators) => {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            validators.write_headers(response.headers_mut());
            response
        }
        Conditional::Modified(body, validators) => {
            let mut response = Json(body).into_response();
            if let Some(validators) = validators {
                validators.write_headers(response.headers_mut());
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_event_id_rejects_garbage() {
        let err = parse_event_id("65f1c0ffee").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "invalid event id"));
    }

    #[test]
    fn if_none_match_reads_the_raw_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(if_none_match(&headers), None);

        headers.insert(header::IF_NONE_MATCH, "\"abc\"".parse().unwrap());
        assert_eq!(if_none_match(&headers), Some("\"abc\""));
    }
}
