// [libs/domain/models/src/session.rs]
//! Opaque session TTL store entity, layered on C1 with
//! the blob store's expiry convention for parity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub key: String,
    pub value: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(key: String, value: serde_json::Value, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            key,
            value,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at <= at
    }

    pub fn touch(&mut self, ttl: chrono::Duration) {
        self.expires_at = Utc::now() + ttl;
    }
}
