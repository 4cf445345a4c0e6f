// [libs/infra/db/src/repositories/job/mod.rs]
/*!
 * APARATO: JOB REPOSITORY (C1 / C6)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTION TRANSACCIONAL DEL CICLO DE VIDA DE JOBS
 *
 * El despacho atomico se implementa como una busqueda seguida de un
 * UPDATE guardado por `WHERE status = 'pending'`, ambos dentro de la
 * misma transaccion: el motor de escritura unica de libSQL serializa
 * transacciones concurrentes, de modo que la guarda basta para que
 * ningun job sea arrendado a dos workers.
 */

pub mod queries;

use bin2nlp_domain_models::job::{retry_backoff_seconds, MAX_RETRIES};
use bin2nlp_domain_models::{Job, JobConfig, JobPriority, JobStatus, QueueStats};
use chrono::{DateTime, Duration, Utc};
use libsql::{params, Connection, Row};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::DbError;
use self::queries as sql;

pub struct JobRepository {
    connection: Connection,
}

impl JobRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, job))]
    pub async fn insert_job(&self, job: &Job) -> Result<(), DbError> {
        let config_json = serde_json::to_string(&job.config).map_err(|e| DbError::MappingError(e.to_string()))?;
        let metadata_json = serde_json::to_string(&job.metadata).map_err(|e| DbError::MappingError(e.to_string()))?;

        self.connection
            .execute(
                sql::INSERT_JOB,
                params![
                    job.id.to_string(),
                    job.priority.as_str(),
                    job.file_fingerprint.clone(),
                    job.input_blob_ref.clone(),
                    job.original_filename.clone(),
                    config_json,
                    job.tenant_id.clone(),
                    job.callback_url.clone(),
                    job.correlation_id.clone(),
                    metadata_json,
                    job.created_at.to_rfc3339(),
                ],
            )
            .await?;

        info!(job_id = %job.id, "📥 [queue]: job inserted as pending");
        Ok(())
    }

    /// Atomically leases the oldest eligible job in the highest non-empty
    /// priority lane, or returns `Ok(None)` if the queue is empty.
    #[instrument(skip(self))]
    pub async fn atomic_lease_next(&self, worker_id: &str) -> Result<Option<Job>, DbError> {
        let transaction = self.connection.transaction().await.map_err(|_| DbError::TransactionError)?;
        let now = Utc::now();

        let mut candidate_rows = transaction
            .query(sql::FIND_NEXT_ELIGIBLE_JOB, params![now.to_rfc3339()])
            .await?;

        let Some(row) = candidate_rows.next().await? else {
            transaction.commit().await.map_err(|_| DbError::TransactionError)?;
            return Ok(None);
        };
        let job_id: String = row.get(0)?;

        let rows_affected = transaction
            .execute(sql::CLAIM_JOB, params![worker_id, now.to_rfc3339(), job_id.clone()])
            .await?;

        if rows_affected == 0 {
            // Another transaction claimed it between the select and the update
            // (possible if the isolation level permits non-repeatable reads).
            transaction.commit().await.map_err(|_| DbError::TransactionError)?;
            return Ok(None);
        }

        transaction
            .execute(sql::INSERT_LEASE, params![job_id.clone(), worker_id, now.to_rfc3339()])
            .await?;

        let mut job_rows = transaction.query(sql::SELECT_JOB_BY_ID, params![job_id.clone()]).await?;
        let job_row = job_rows.next().await?.ok_or(DbError::JobNotFound)?;
        let job = row_to_job(&job_row)?;

        transaction.commit().await.map_err(|_| DbError::TransactionError)?;

        info!(job_id = %job.id, worker_id, "🎫 [queue]: job leased");
        Ok(Some(job))
    }

    #[instrument(skip(self))]
    pub async fn update_progress(
        &self,
        job_id: Uuid,
        worker_id: &str,
        percentage: u8,
        stage: Option<&str>,
    ) -> Result<(), DbError> {
        let clamped = percentage.min(100);
        let rows_affected = self
            .connection
            .execute(
                sql::UPDATE_PROGRESS,
                params![
                    clamped as i64,
                    stage,
                    Utc::now().to_rfc3339(),
                    job_id.to_string(),
                    worker_id
                ],
            )
            .await?;

        if rows_affected == 0 {
            warn!(job_id = %job_id, worker_id, "⚠️ [queue]: progress update rejected, lease no longer held");
            return Err(DbError::OwnershipConflict);
        }
        Ok(())
    }

    #[instrument(skip(self, result_ref))]
    pub async fn finalize_success(&self, job_id: Uuid, worker_id: &str, result_ref: &str) -> Result<(), DbError> {
        let rows_affected = self
            .connection
            .execute(
                sql::FINALIZE_SUCCESS,
                params![result_ref, Utc::now().to_rfc3339(), job_id.to_string(), worker_id],
            )
            .await?;
        if rows_affected == 0 {
            return Err(DbError::OwnershipConflict);
        }
        self.connection.execute(sql::DELETE_LEASE, params![job_id.to_string()]).await?;
        info!(job_id = %job_id, "✅ [queue]: job finalized as completed");
        Ok(())
    }

    /// Serves a `pending` job straight from a C5 cache hit, bypassing the
    /// lease cycle entirely.
    #[instrument(skip(self, result_ref))]
    pub async fn complete_from_cache(&self, job_id: Uuid, result_ref: &str) -> Result<(), DbError> {
        let rows_affected = self
            .connection
            .execute(
                sql::FINALIZE_FROM_CACHE,
                params![result_ref, Utc::now().to_rfc3339(), job_id.to_string()],
            )
            .await?;
        if rows_affected == 0 {
            return Err(DbError::OwnershipConflict);
        }
        info!(job_id = %job_id, "⚡ [queue]: job served directly from cache hit");
        Ok(())
    }

    /// Either reschedules with exponential back-off (if the retry budget
    /// allows) or dead-letters the job permanently.
    #[instrument(skip(self, job_snapshot))]
    pub async fn fail(&self, job_id: Uuid, worker_id: &str, reason: &str, job_snapshot: &Job) -> Result<bool, DbError> {
        let will_retry = job_snapshot.retry_count < MAX_RETRIES;
        let now = Utc::now();

        if will_retry {
            let next_attempt = job_snapshot.retry_count + 1;
            let delay_seconds = retry_backoff_seconds(next_attempt);
            let next_eligible_at = now + Duration::seconds(delay_seconds as i64);

            self.connection
                .execute(
                    sql::REQUEUE_FOR_RETRY,
                    params![reason, next_eligible_at.to_rfc3339(), now.to_rfc3339(), job_id.to_string()],
                )
                .await?;
            self.connection.execute(sql::DELETE_LEASE, params![job_id.to_string()]).await?;

            warn!(job_id = %job_id, delay_seconds, "♻️ [queue]: job requeued for retry");
        } else {
            let rows_affected = self
                .connection
                .execute(
                    sql::FINALIZE_FAILURE_TERMINAL,
                    params![reason, now.to_rfc3339(), job_id.to_string(), worker_id],
                )
                .await?;
            if rows_affected == 0 {
                return Err(DbError::OwnershipConflict);
            }
            self.connection.execute(sql::DELETE_LEASE, params![job_id.to_string()]).await?;

            let snapshot_json = serde_json::to_string(job_snapshot).map_err(|e| DbError::MappingError(e.to_string()))?;
            self.connection
                .execute(
                    sql::INSERT_DEAD_LETTER,
                    params![job_id.to_string(), reason, now.to_rfc3339(), snapshot_json],
                )
                .await?;

            warn!(job_id = %job_id, "💀 [queue]: retry budget exhausted, job dead-lettered");
        }

        Ok(will_retry)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, job_id: Uuid) -> Result<bool, DbError> {
        let rows_affected = self
            .connection
            .execute(sql::CANCEL_JOB, params![Utc::now().to_rfc3339(), job_id.to_string()])
            .await?;
        Ok(rows_affected > 0)
    }

    pub async fn get(&self, job_id: Uuid) -> Result<Job, DbError> {
        let mut rows = self.connection.query(sql::SELECT_JOB_BY_ID, params![job_id.to_string()]).await?;
        let row = rows.next().await?.ok_or(DbError::JobNotFound)?;
        row_to_job(&row)
    }

    /// Forcibly fails every `processing` row whose lease has aged past
    /// `stale_timeout`, returning the count reclaimed.
    #[instrument(skip(self))]
    pub async fn reap_stale_leases(&self, stale_timeout: Duration) -> Result<u64, DbError> {
        let cutoff = Utc::now() - stale_timeout;
        let mut rows = self.connection.query(sql::SELECT_STALE_PROCESSING, params![cutoff.to_rfc3339()]).await?;

        let mut stale = Vec::new();
        while let Some(row) = rows.next().await? {
            let job_id: String = row.get(0)?;
            let worker_id: String = row.get(1)?;
            stale.push((job_id, worker_id));
        }

        let mut reaped = 0u64;
        for (job_id_str, worker_id) in stale {
            let job_id = Uuid::parse_str(&job_id_str).map_err(|e| DbError::MappingError(e.to_string()))?;
            let job = self.get(job_id).await?;
            if self.fail(job_id, &worker_id, "stale lease", &job).await.is_ok() {
                reaped += 1;
                warn!(job_id = %job_id, worker_id, "⏱️ [reaper]: stale lease reclaimed");
            }
        }

        Ok(reaped)
    }

    #[instrument(skip(self))]
    pub async fn accumulate_processing_time(&self, job_id: Uuid, delta_ms: u64) -> Result<(), DbError> {
        self.connection
            .execute(
                sql::ACCUMULATE_PROCESSING_TIME,
                params![delta_ms as i64, Utc::now().to_rfc3339(), job_id.to_string()],
            )
            .await?;
        Ok(())
    }

    pub async fn queue_stats(&self) -> Result<QueueStats, DbError> {
        let mut stats = QueueStats::default();

        let mut rows = self.connection.query(sql::COUNT_PENDING_BY_PRIORITY, ()).await?;
        while let Some(row) = rows.next().await? {
            let priority: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            match JobPriority::parse(&priority) {
                Some(JobPriority::Urgent) => stats.urgent_pending = count as u64,
                Some(JobPriority::High) => stats.high_pending = count as u64,
                Some(JobPriority::Normal) => stats.normal_pending = count as u64,
                Some(JobPriority::Low) => stats.low_pending = count as u64,
                None => {}
            }
        }

        stats.processing = scalar_count(&self.connection, sql::COUNT_PROCESSING).await?;
        stats.dead_letter_size = scalar_count(&self.connection, sql::COUNT_DEAD_LETTERS).await?;
        stats.completed_total = scalar_count(&self.connection, sql::COUNT_COMPLETED).await?;
        stats.failed_total = scalar_count(&self.connection, sql::COUNT_FAILED).await?;

        Ok(stats)
    }
}

async fn scalar_count(connection: &Connection, sql: &str) -> Result<u64, DbError> {
    let mut rows = connection.query(sql, ()).await?;
    let row = rows.next().await?.ok_or(DbError::MappingError("expected scalar row".into()))?;
    let count: i64 = row.get(0)?;
    Ok(count as u64)
}

fn row_to_job(row: &Row) -> Result<Job, DbError> {
    let id: String = row.get(0)?;
    let status: String = row.get(1)?;
    let priority: String = row.get(2)?;
    let file_fingerprint: String = row.get(3)?;
    let input_blob_ref: String = row.get(4)?;
    let result_blob_ref: Option<String> = row.get(5)?;
    let original_filename: String = row.get(6)?;
    let config_json: String = row.get(7)?;
    let progress_percentage: i64 = row.get(8)?;
    let current_stage: Option<String> = row.get(9)?;
    let worker_id: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    let started_at: Option<String> = row.get(12)?;
    let updated_at: String = row.get(13)?;
    let completed_at: Option<String> = row.get(14)?;
    let tenant_id: String = row.get(15)?;
    let callback_url: Option<String> = row.get(16)?;
    let correlation_id: Option<String> = row.get(17)?;
    let retry_count: i64 = row.get(18)?;
    let processing_time_accumulated_ms: i64 = row.get(19)?;
    let error_message: Option<String> = row.get(20)?;
    let metadata_json: String = row.get(21)?;

    Ok(Job {
        id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        status: JobStatus::parse(&status).ok_or_else(|| DbError::MappingError(format!("unknown status {status}")))?,
        priority: JobPriority::parse(&priority).ok_or_else(|| DbError::MappingError(format!("unknown priority {priority}")))?,
        file_fingerprint,
        input_blob_ref,
        result_blob_ref,
        original_filename,
        config: serde_json::from_str::<JobConfig>(&config_json).map_err(|e| DbError::MappingError(e.to_string()))?,
        progress_percentage: progress_percentage as u8,
        current_stage,
        worker_id,
        created_at: parse_rfc3339(&created_at)?,
        started_at: started_at.map(|s| parse_rfc3339(&s)).transpose()?,
        updated_at: parse_rfc3339(&updated_at)?,
        completed_at: completed_at.map(|s| parse_rfc3339(&s)).transpose()?,
        tenant_id,
        callback_url,
        correlation_id,
        retry_count: retry_count as u32,
        processing_time_accumulated_ms: processing_time_accumulated_ms as u64,
        error_message,
        metadata: serde_json::from_str(&metadata_json).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}
