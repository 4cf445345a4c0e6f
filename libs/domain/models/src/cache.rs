// [libs/domain/models/src/cache.rs]
//! Cache entry entity for C5 (Result Cache).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A materialized prior translation result, indexed by a derived cache key.
///
/// Invariant: `expires_at > created_at`; a live entry is referenced by
/// exactly one blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub file_fingerprint: String,
    pub config_fingerprint: String,
    pub result_blob_ref: String,
    pub schema_version: u32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub access_count: u64,
}

/// Current schema version of the result document. A read against an entry
/// tagged with a different version is treated as a miss.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

impl CacheEntry {
    pub fn new(
        cache_key: String,
        file_fingerprint: String,
        config_fingerprint: String,
        result_blob_ref: String,
        tags: Vec<String>,
        ttl: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            cache_key,
            file_fingerprint,
            config_fingerprint,
            result_blob_ref,
            schema_version: CURRENT_SCHEMA_VERSION,
            tags,
            created_at: now,
            expires_at: now + ttl,
            access_count: 0,
        }
    }

    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at <= at
    }

    pub fn is_stale_schema(&self) -> bool {
        self.schema_version != CURRENT_SCHEMA_VERSION
    }
}

/// Best-effort counters exposed by `ResultCache::stats()`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
}
