//! Conditional-request validators derived from event state.

use std::fmt::Write as _;
use std::time::SystemTime;

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    pub etag: String,
    pub last_modified: String,
}

impl Validators {
    pub fn for_event(event: &Event) -> Self {
        Self {
            etag: etag(event.id, event.updated_at),
            last_modified: last_modified(event.updated_at),
        }
    }

    /// The cached copy is still valid only when `If-None-Match` is exactly our tag.
    pub fn matches(&self, if_none_match: Option<&str>) -> bool {
        if_none_match.is_some_and(|presented| presented == self.etag)
    }

    pub fn write_headers(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.etag) {
            headers.insert(header::ETAG, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.last_modified) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }
}

/// Strong entity tag over `(id, updated_at)`; no other field takes part.
pub fn etag(id: Uuid, updated_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(updated_at.timestamp().to_be_bytes());
    hasher.update(updated_at.timestamp_subsec_nanos().to_be_bytes());
    let digest = hasher.finalize();

    let mut tag = String::with_capacity(2 + 32);
    tag.push('"');
    for byte in &digest[..16] {
        let _ = write!(tag, "{byte:02x}");
    }
    tag.push('"');
    tag
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn last_modified(updated_at: DateTime<Utc>) -> String {
    httpdate::fmt_http_date(SystemTime::from(updated_at))
}
