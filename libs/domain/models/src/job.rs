// [libs/domain/models/src/job.rs]
/*!
 * Job entity — the unit of work carried through C6 (Job Queue) and C7
 * (Pipeline Executor).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JobConfig;

/// Lifecycle status of a `Job`. Transitions are monotonic except for the
/// `Failed -> Pending` retry path (see `fail_job` in the queue component).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

/// Priority lane. Ordering matches queue dispatch order: `Urgent` is
/// served before `High`, before `Normal`, before `Low`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low = 0,
    Normal = 1,
    High = 2,
    Urgent = 3,
}

impl JobPriority {
    /// Priority lanes ordered from highest to lowest, the order the queue
    /// scans when looking for work.
    pub const LANES_HIGH_TO_LOW: [JobPriority; 4] = [
        JobPriority::Urgent,
        JobPriority::High,
        JobPriority::Normal,
        JobPriority::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobPriority::Urgent => "urgent",
            JobPriority::High => "high",
            JobPriority::Normal => "normal",
            JobPriority::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "urgent" => Some(JobPriority::Urgent),
            "high" => Some(JobPriority::High),
            "normal" => Some(JobPriority::Normal),
            "low" => Some(JobPriority::Low),
            _ => None,
        }
    }
}

/// A unit of work tracked end-to-end from submission to completion.
///
/// Invariant (enforced by the metadata store, not by this type): exactly
/// one of `(worker_id.is_some() && status == Processing)` or
/// `(worker_id.is_none() && status in {Pending, Completed, Failed,
/// Cancelled})` holds at any commit point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub file_fingerprint: String,
    pub input_blob_ref: String,
    pub result_blob_ref: Option<String>,
    pub original_filename: String,
    pub config: JobConfig,
    pub progress_percentage: u8,
    pub current_stage: Option<String>,
    pub worker_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub tenant_id: String,
    pub callback_url: Option<String>,
    pub correlation_id: Option<String>,
    pub retry_count: u32,
    pub processing_time_accumulated_ms: u64,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
}

impl Job {
    /// Builds a freshly submitted job in `Pending` status.
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        file_fingerprint: String,
        input_blob_ref: String,
        original_filename: String,
        config: JobConfig,
        priority: JobPriority,
        tenant_id: String,
        callback_url: Option<String>,
        correlation_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            priority,
            file_fingerprint,
            input_blob_ref,
            result_blob_ref: None,
            original_filename,
            config,
            progress_percentage: 0,
            current_stage: None,
            worker_id: None,
            created_at: now,
            started_at: None,
            updated_at: now,
            completed_at: None,
            tenant_id,
            callback_url,
            correlation_id,
            retry_count: 0,
            processing_time_accumulated_ms: 0,
            error_message: None,
            metadata: serde_json::json!({}),
        }
    }
}

/// Maximum retry attempts before a job is dead-lettered.
pub const MAX_RETRIES: u32 = 3;

/// Computes the exponential back-off delay in seconds for retry attempt
/// `attempt` (1-indexed), capped at 30 seconds.
pub fn retry_backoff_seconds(attempt: u32) -> u64 {
    2u64.saturating_pow(attempt).min(30)
}
