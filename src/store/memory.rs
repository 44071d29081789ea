use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::models::{Event, EventChanges};

/// Process-local event store with the same query shapes as the Postgres one.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<Uuid, Event>>,
    offline: bool,
    latency: Option<Duration>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with [`StoreError::Unavailable`].
    pub fn toggle_offline(&mut self) {
        self.offline = !self.offline;
    }

    /// Delays every call, to exercise caller deadlines.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    async fn ready(&self) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        self.ready().await?;
        self.events.write().await.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_by_owner(
        &self,
        owner: Uuid,
        title_contains: Option<&str>,
    ) -> Result<Vec<Event>, StoreError> {
        self.ready().await?;
        let needle = title_contains.map(str::to_lowercase);
        let events = self.events.read().await;

        Ok(events
            .values()
            .filter(|event| event.owner_id == owner)
            .filter(|event| match &needle {
                Some(needle) => event
                    .title
                    .as_deref()
                    .is_some_and(|title| title.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn find_one(&self, id: Uuid, owner: Uuid) -> Result<Option<Event>, StoreError> {
        self.ready().await?;
        let events = self.events.read().await;
        Ok(events
            .get(&id)
            .filter(|event| event.owner_id == owner)
            .cloned())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &EventChanges,
    ) -> Result<bool, StoreError> {
        self.ready().await?;
        let mut events = self.events.write().await;
        match events.get_mut(&id).filter(|event| event.owner_id == owner) {
            Some(event) => {
                changes.apply(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_one(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        self.ready().await?;
        let mut events = self.events.write().await;
        if events.get(&id).is_some_and(|event| event.owner_id == owner) {
            events.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
