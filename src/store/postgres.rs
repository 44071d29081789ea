use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::models::{Event, EventChanges};

const EVENT_COLUMNS: &str = "id, owner_id, title, description, location, target_amount, \
     deadline, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO events (id, owner_id, title, description, location, target_amount, \
             deadline, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(event.id)
        .bind(event.owner_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.target_amount)
        .bind(event.deadline)
        .bind(&event.status)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_owner(
        &self,
        owner: Uuid,
        title_contains: Option<&str>,
    ) -> Result<Vec<Event>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE owner_id = "
        ));
        query.push_bind(owner);

        if let Some(needle) = title_contains {
            query
                .push(" AND title ILIKE ")
                .push_bind(like_pattern(needle))
                .push(" ESCAPE '\\'");
        }

        let events = query
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn find_one(&self, id: Uuid, owner: Uuid) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &EventChanges,
    ) -> Result<bool, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE events SET updated_at = GREATEST(");
        query
            .push_bind(changes.updated_at)
            .push(", updated_at + INTERVAL '1 microsecond')");

        if let Some(title) = &changes.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = &changes.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(location) = &changes.location {
            query.push(", location = ").push_bind(location);
        }
        if let Some(amount) = changes.target_amount {
            query.push(", target_amount = ").push_bind(amount);
        }
        if let Some(deadline) = changes.deadline {
            query.push(", deadline = ").push_bind(deadline);
        }
        if let Some(status) = &changes.status {
            query.push(", status = ").push_bind(status);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND owner_id = ")
            .push_bind(owner);

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_one(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Wraps `needle` for an `ILIKE ... ESCAPE '\'` match, escaping the pattern
/// metacharacters so user input is matched as plain text.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
