use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::OwnerKey;
use crate::models::{CreateEventRequest, Event, EventPatch};
use crate::services::cache::Validators;
use crate::store::{EventStore, StoreError};
use crate::utils::error::{AppError, StoreOp};

const NOT_FOUND: &str = "event not found or not owned";

/// Per-call storage deadlines.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    /// Create, get, update and delete.
    pub write: Duration,
    /// Owner scans.
    pub list: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            write: Duration::from_secs(5),
            list: Duration::from_secs(10),
        }
    }
}

/// Outcome of a read that honours `If-None-Match`.
#[derive(Debug)]
pub enum Conditional<T> {
    Fresh(Validators),
    Modified(T, Option<Validators>),
}

/// Create, list, get, update and delete of events, always scoped to the caller.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    deadlines: Deadlines,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>, deadlines: Deadlines) -> Self {
        Self { store, deadlines }
    }

    #[instrument(skip(self, request), fields(owner = %owner))]
    pub async fn create(
        &self,
        owner: OwnerKey,
        request: CreateEventRequest,
    ) -> Result<Uuid, AppError> {
        let event = Event::new(owner.id(), request, Utc::now());

        bounded(StoreOp::Create, self.deadlines.write, self.store.insert(&event)).await?;

        info!(event_id = %event.id, "event created");
        Ok(event.id)
    }

    /// Lists the caller's events; validators come from the most recently
    /// updated one and are absent for an empty result.
    #[instrument(skip(self, if_none_match), fields(owner = %owner))]
    pub async fn list(
        &self,
        owner: OwnerKey,
        query: Option<&str>,
        if_none_match: Option<&str>,
    ) -> Result<Conditional<Vec<Event>>, AppError> {
        let query = query.filter(|q| !q.is_empty());
        let events = bounded(
            StoreOp::List,
            self.deadlines.list,
            self.store.find_by_owner(owner.id(), query),
        )
        .await?;

        // Ties on updated_at fall back to the id so repeated lists agree on the tag.
        let Some(latest) = events
            .iter()
            .max_by_key(|event| (event.updated_at, event.id))
        else {
            return Ok(Conditional::Modified(events, None));
        };

        let validators = Validators::for_event(latest);
        if validators.matches(if_none_match) {
            return Ok(Conditional::Fresh(validators));
        }

        Ok(Conditional::Modified(events, Some(validators)))
    }

    #[instrument(skip(self, if_none_match), fields(owner = %owner))]
    pub async fn get(
        &self,
        owner: OwnerKey,
        id: Uuid,
        if_none_match: Option<&str>,
    ) -> Result<Conditional<Event>, AppError> {
        let event = bounded(
            StoreOp::Get,
            self.deadlines.write,
            self.store.find_one(id, owner.id()),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

        let validators = Validators::for_event(&event);
        if validators.matches(if_none_match) {
            return Ok(Conditional::Fresh(validators));
        }

        Ok(Conditional::Modified(event, Some(validators)))
    }

    #[instrument(skip(self, patch), fields(owner = %owner))]
    pub async fn update(
        &self,
        owner: OwnerKey,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<Uuid, AppError> {
        let changes = patch
            .into_changes(Utc::now())
            .ok_or_else(|| AppError::BadRequest("no fields to update".to_string()))?;

        let matched = bounded(
            StoreOp::Update,
            self.deadlines.write,
            self.store.update_fields(id, owner.id(), &changes),
        )
        .await?;

        if !matched {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }

        info!(event_id = %id, "event updated");
        Ok(id)
    }

    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn delete(&self, owner: OwnerKey, id: Uuid) -> Result<Uuid, AppError> {
        let deleted = bounded(
            StoreOp::Delete,
            self.deadlines.write,
            self.store.delete_one(id, owner.id()),
        )
        .await?;

        if !deleted {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }

        info!(event_id = %id, "event deleted");
        Ok(id)
    }
}

/// Runs one storage call under `limit`. The call is dropped, and with it any
/// in-flight work, when the deadline fires or the caller goes away.
async fn bounded<T, F>(operation: StoreOp, limit: Duration, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(AppError::storage(operation)),
        Err(_) => Err(AppError::Timeout { operation }),
    }
}
