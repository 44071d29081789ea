use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventChanges};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("event store is unavailable")]
    Unavailable,
}

/// Persistence for events. Every lookup, write and delete takes the owner key
/// and must apply it inside the storage query, never as a post-filter.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: &Event) -> Result<(), StoreError>;

    /// All events of `owner`, optionally narrowed to titles containing
    /// `title_contains` (case-insensitive, literal text).
    async fn find_by_owner(
        &self,
        owner: Uuid,
        title_contains: Option<&str>,
    ) -> Result<Vec<Event>, StoreError>;

    async fn find_one(&self, id: Uuid, owner: Uuid) -> Result<Option<Event>, StoreError>;

    /// Returns whether a document matched `(id, owner)`.
    async fn update_fields(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &EventChanges,
    ) -> Result<bool, StoreError>;

    /// Returns whether a document was removed.
    async fn delete_one(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
}
