// [libs/domain/models/src/worker.rs]
//! Worker lease and heartbeat entities for C1/C6/C8.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Association between a worker id and a job id.
///
/// Invariant: at most one live lease per job; a lease older than the
/// configured stale-timeout is reclaimable by the reaper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerLease {
    pub job_id: Uuid,
    pub worker_id: String,
    pub started_at: DateTime<Utc>,
}

impl WorkerLease {
    pub fn age_seconds(&self, at: DateTime<Utc>) -> i64 {
        (at - self.started_at).num_seconds().max(0)
    }

    pub fn is_stale(&self, at: DateTime<Utc>, stale_timeout_seconds: i64) -> bool {
        self.age_seconds(at) > stale_timeout_seconds
    }
}

/// A liveness report from a worker loop, independent of whether it
/// currently holds a job lease, so idle workers stay observable too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    pub worker_id: String,
    pub last_seen_at: DateTime<Utc>,
    pub current_job_id: Option<Uuid>,
}

impl WorkerHeartbeat {
    pub fn is_alive(&self, at: DateTime<Utc>, timeout_seconds: i64) -> bool {
        (at - self.last_seen_at).num_seconds() <= timeout_seconds
    }
}

/// Per-lane and aggregate snapshot exposed by the queue.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub urgent_pending: u64,
    pub high_pending: u64,
    pub normal_pending: u64,
    pub low_pending: u64,
    pub processing: u64,
    pub dead_letter_size: u64,
    pub completed_total: u64,
    pub failed_total: u64,
}
