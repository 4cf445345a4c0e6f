// [libs/domain/models/src/blob.rs]
//! Blob metadata entity for C2.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sidecar metadata written beside every payload in the blob store, as
/// `<hash>.meta`. Expiry is determined from this record alone; absence of
/// the sidecar is treated as "expired/absent" for the payload too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub original_key: String,
}

impl BlobMetadata {
    pub fn new(original_key: String, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            expires_at: now + ttl,
            original_key,
        }
    }

    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at <= at
    }
}
