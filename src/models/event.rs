use chrono::{DateTime, Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status stamped on every freshly created event.
pub const DEFAULT_STATUS: &str = "ACTIVE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_amount: Option<Decimal>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(owner_id: Uuid, request: CreateEventRequest, now: DateTime<Utc>) -> Self {
        let now = storage_timestamp(now);
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: request.title,
            description: request.description,
            location: request.location,
            target_amount: request.target_amount,
            deadline: request.deadline.map(storage_timestamp),
            status: DEFAULT_STATUS.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of a create request. Ownership, status and timestamps are never
/// taken from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_amount: Option<Decimal>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Body of a partial update.
///
/// An empty string or a zero amount is read as "leave unchanged", the same as
/// an absent field. A `null` deadline is absent too, so a deadline can be
/// replaced but not cleared through a patch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_amount: Option<Decimal>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl EventPatch {
    /// Reduces the patch to the fields that will actually be written.
    ///
    /// Returns `None` when nothing besides `updated_at` would change.
    pub fn into_changes(self, now: DateTime<Utc>) -> Option<EventChanges> {
        let changes = EventChanges {
            title: non_empty(self.title),
            description: non_empty(self.description),
            location: non_empty(self.location),
            target_amount: self.target_amount.filter(|amount| !amount.is_zero()),
            deadline: self.deadline.map(storage_timestamp),
            status: non_empty(self.status),
            updated_at: storage_timestamp(now),
        };

        if changes.is_empty() {
            None
        } else {
            Some(changes)
        }
    }
}

/// The set of column writes produced by a merged patch.
#[derive(Debug, Clone, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_amount: Option<Decimal>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.target_amount.is_none()
            && self.deadline.is_none()
            && self.status.is_none()
    }

    /// Writes the changes into `event`. `updated_at` always moves forward,
    /// even when the clock reads the same instant as the stored value.
    pub fn apply(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = Some(title.clone());
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            event.location = Some(location.clone());
        }
        if let Some(amount) = self.target_amount {
            event.target_amount = Some(amount);
        }
        if let Some(deadline) = self.deadline {
            event.deadline = Some(deadline);
        }
        if let Some(status) = &self.status {
            event.status = status.clone();
        }
        event.updated_at = next_updated_at(event.updated_at, self.updated_at);
    }
}

/// Smallest step between two successive `updated_at` values.
pub fn min_tick() -> Duration {
    Duration::microseconds(1)
}

pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + min_tick())
}

/// Postgres keeps microseconds; truncating up front keeps the fingerprint of
/// a written event equal to the one computed from its read-back copy.
pub fn storage_timestamp(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
