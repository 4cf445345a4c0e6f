// [libs/infra/db/src/repositories/job/queries.rs]
//! SQL statement registry for the job repository. Centralized so the
//! transactional dequeue and its guard conditions are auditable in one
//! place.

pub const INSERT_JOB: &str = r#"
    INSERT INTO jobs (
        id, status, priority, file_fingerprint, input_blob_ref, original_filename,
        config_json, tenant_id, callback_url, correlation_id, metadata_json,
        created_at, updated_at, next_eligible_at
    ) VALUES (?1, 'pending', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11, ?11)
"#;

/// Highest non-empty lane, oldest arrival first, restricted to jobs whose
/// back-off window has elapsed.
pub const FIND_NEXT_ELIGIBLE_JOB: &str = r#"
    SELECT id FROM jobs
    WHERE status = 'pending' AND next_eligible_at <= ?1
    ORDER BY
        CASE priority
            WHEN 'urgent' THEN 0
            WHEN 'high' THEN 1
            WHEN 'normal' THEN 2
            ELSE 3
        END ASC,
        created_at ASC
    LIMIT 1
"#;

/// Guarded transition: only succeeds if the row is still `pending` at
/// commit time, so concurrent transactions racing for the same id never
/// both win.
pub const CLAIM_JOB: &str = r#"
    UPDATE jobs
    SET status = 'processing', worker_id = ?1, started_at = ?2, updated_at = ?2
    WHERE id = ?3 AND status = 'pending'
"#;

pub const SELECT_JOB_BY_ID: &str = r#"
    SELECT
        id, status, priority, file_fingerprint, input_blob_ref, result_blob_ref,
        original_filename, config_json, progress_percentage, current_stage, worker_id,
        created_at, started_at, updated_at, completed_at, tenant_id, callback_url,
        correlation_id, retry_count, processing_time_accumulated_ms, error_message,
        metadata_json
    FROM jobs WHERE id = ?1
"#;

pub const INSERT_LEASE: &str = r#"
    INSERT OR REPLACE INTO worker_leases (job_id, worker_id, started_at) VALUES (?1, ?2, ?3)
"#;

pub const DELETE_LEASE: &str = "DELETE FROM worker_leases WHERE job_id = ?1";

pub const UPDATE_PROGRESS: &str = r#"
    UPDATE jobs
    SET progress_percentage = ?1, current_stage = ?2, updated_at = ?3
    WHERE id = ?4 AND worker_id = ?5 AND status = 'processing'
"#;

pub const FINALIZE_SUCCESS: &str = r#"
    UPDATE jobs
    SET status = 'completed', result_blob_ref = ?1, progress_percentage = 100,
        completed_at = ?2, updated_at = ?2, worker_id = NULL
    WHERE id = ?3 AND worker_id = ?4 AND status = 'processing'
"#;

/// Serves a freshly submitted job straight from a cache hit, skipping the
/// lease cycle entirely: a `pending` row goes directly to `completed`.
pub const FINALIZE_FROM_CACHE: &str = r#"
    UPDATE jobs
    SET status = 'completed', result_blob_ref = ?1, progress_percentage = 100,
        completed_at = ?2, updated_at = ?2
    WHERE id = ?3 AND status = 'pending'
"#;

pub const FINALIZE_FAILURE_TERMINAL: &str = r#"
    UPDATE jobs
    SET status = 'failed', error_message = ?1, completed_at = ?2, updated_at = ?2, worker_id = NULL
    WHERE id = ?3 AND worker_id = ?4 AND status = 'processing'
"#;

pub const REQUEUE_FOR_RETRY: &str = r#"
    UPDATE jobs
    SET status = 'pending', worker_id = NULL, started_at = NULL, retry_count = retry_count + 1,
        error_message = ?1, next_eligible_at = ?2, updated_at = ?3
    WHERE id = ?4
"#;

pub const CANCEL_JOB: &str = r#"
    UPDATE jobs
    SET status = 'cancelled', updated_at = ?1
    WHERE id = ?2 AND status IN ('pending', 'processing')
"#;

pub const SELECT_STALE_PROCESSING: &str = r#"
    SELECT id, worker_id FROM jobs
    WHERE status = 'processing' AND started_at IS NOT NULL AND started_at <= ?1
"#;

pub const ACCUMULATE_PROCESSING_TIME: &str = r#"
    UPDATE jobs SET processing_time_accumulated_ms = processing_time_accumulated_ms + ?1, updated_at = ?2
    WHERE id = ?3
"#;

pub const INSERT_DEAD_LETTER: &str = r#"
    INSERT OR REPLACE INTO dead_letters (job_id, reason, failed_at, job_snapshot_json)
    VALUES (?1, ?2, ?3, ?4)
"#;

pub const COUNT_PENDING_BY_PRIORITY: &str = r#"
    SELECT priority, COUNT(*) FROM jobs WHERE status = 'pending' GROUP BY priority
"#;

pub const COUNT_PROCESSING: &str = "SELECT COUNT(*) FROM jobs WHERE status = 'processing'";
pub const COUNT_DEAD_LETTERS: &str = "SELECT COUNT(*) FROM dead_letters";
pub const COUNT_COMPLETED: &str = "SELECT COUNT(*) FROM jobs WHERE status = 'completed'";
pub const COUNT_FAILED: &str = "SELECT COUNT(*) FROM jobs WHERE status = 'failed'";
