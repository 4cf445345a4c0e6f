// [libs/domain/job-queue/src/lib.rs]
/*!
 * APARATO: JOB QUEUE (C6)
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: DESPACHO ATOMICO CON PRIORIDAD, REINTENTO Y
 * DEAD-LETTERING SOBRE LA AUTORIDAD TRANSACCIONAL DE C1
 *
 * Cuatro carriles logicos (urgent/high/normal/low), FIFO por llegada
 * dentro de cada carril. El despacho atomico en si vive en
 * `JobRepository::atomic_lease_next` (una unica sentencia guardada por
 * `WHERE status = 'pending'`); este componente añade la politica de
 * dominio alrededor de esa primitiva: construccion de `Job`, reintento
 * con back-off, cancelacion y estadisticas, sin duplicar SQL.
 */

pub mod errors;

use std::sync::Arc;
use std::time::Duration;

use bin2nlp_domain_models::{Job, JobConfig, JobPriority, QueueStats};
use bin2nlp_infra_db::{DbClient, JobRepository};
use tracing::{instrument, warn};
use uuid::Uuid;

pub use errors::JobQueueError;

pub struct JobQueue {
    db: Arc<DbClient>,
}

impl JobQueue {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db }
    }

    fn repository(&self) -> Result<JobRepository, JobQueueError> {
        let connection = self
            .db
            .get_connection()
            .map_err(|e| JobQueueError::Storage(e.to_string()))?;
        Ok(JobRepository::new(connection))
    }

    /// Admits a freshly built job as `pending`. The
    /// caller is responsible for having already written the input bytes to
    /// C2 and checked C4/C5 before calling this.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, config))]
    pub async fn submit(
        &self,
        file_fingerprint: String,
        input_blob_ref: String,
        original_filename: String,
        config: JobConfig,
        priority: JobPriority,
        tenant_id: String,
        callback_url: Option<String>,
        correlation_id: Option<String>,
    ) -> Result<Job, JobQueueError> {
        let job = Job::new_pending(
            file_fingerprint,
            input_blob_ref,
            original_filename,
            config,
            priority,
            tenant_id,
            callback_url,
            correlation_id,
        );
        self.repository()?.insert_job(&job).await?;
        Ok(job)
    }

    /// Atomically leases the oldest eligible job in the highest non-empty
    /// lane, stamping `worker_id` and a start timestamp.
    #[instrument(skip(self))]
    pub async fn lease_next(&self, worker_id: &str) -> Result<Option<Job>, JobQueueError> {
        Ok(self.repository()?.atomic_lease_next(worker_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, job_id: Uuid) -> Result<Job, JobQueueError> {
        Ok(self.repository()?.get(job_id).await?)
    }

    /// Progress updates are idempotent and clamped to `[0,100]`
    /// (`JobRepository::update_progress` performs the clamp); rejected if
    /// the calling worker no longer holds the lease.
    #[instrument(skip(self))]
    pub async fn update_progress(
        &self,
        job_id: Uuid,
        worker_id: &str,
        percentage: u8,
        stage: Option<&str>,
    ) -> Result<(), JobQueueError> {
        Ok(self.repository()?.update_progress(job_id, worker_id, percentage, stage).await?)
    }

    #[instrument(skip(self))]
    pub async fn complete(&self, job_id: Uuid, worker_id: &str, result_blob_ref: &str) -> Result<(), JobQueueError> {
        Ok(self.repository()?.finalize_success(job_id, worker_id, result_blob_ref).await?)
    }

    /// Serves a freshly submitted `pending` job directly from a cache hit,
    /// skipping the lease/execute cycle entirely.
    #[instrument(skip(self))]
    pub async fn complete_from_cache(&self, job_id: Uuid, result_blob_ref: &str) -> Result<(), JobQueueError> {
        Ok(self.repository()?.complete_from_cache(job_id, result_blob_ref).await?)
    }

    /// Reschedules with exponential back-off while the retry budget holds
    /// (`retry_count < MAX_RETRIES`), else dead-letters permanently.
    /// Returns `true` if the job was requeued, `false` if dead-lettered.
    #[instrument(skip(self))]
    pub async fn fail(&self, job_id: Uuid, worker_id: &str, reason: &str) -> Result<bool, JobQueueError> {
        let repo = self.repository()?;
        let snapshot = repo.get(job_id).await?;
        let requeued = repo.fail(job_id, worker_id, reason, &snapshot).await?;
        Ok(requeued)
    }

    /// Cancellation target: `pending` or `processing` rows. A cancellation
    /// on a leased job is observed by the executor at its next suspension
    /// point.
    #[instrument(skip(self))]
    pub async fn cancel(&self, job_id: Uuid) -> Result<bool, JobQueueError> {
        Ok(self.repository()?.cancel(job_id).await?)
    }

    /// Forcibly fails every `processing` row whose lease has aged past
    /// `stale_timeout`, returning them to the retry/dead-letter path
    ///. Intended to be called from a background reaper tick.
    #[instrument(skip(self))]
    pub async fn reap_stale_leases(&self, stale_timeout: Duration) -> Result<u64, JobQueueError> {
        let reaped = self
            .repository()?
            .reap_stale_leases(chrono::Duration::seconds(stale_timeout.as_secs() as i64))
            .await?;
        if reaped > 0 {
            warn!(reaped, "⏱️  [job_queue]: stale leases reclaimed this tick");
        }
        Ok(reaped)
    }

    #[instrument(skip(self))]
    pub async fn accumulate_processing_time(&self, job_id: Uuid, delta_ms: u64) -> Result<(), JobQueueError> {
        Ok(self.repository()?.accumulate_processing_time(job_id, delta_ms).await?)
    }

    /// Per-lane pending depth, processing count, dead-letter size and
    /// rolling completed/failed counters.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(self.repository()?.queue_stats().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bin2nlp_domain_models::{AnalysisDepth, TranslationDetail};

    fn sample_config() -> JobConfig {
        JobConfig {
            analysis_depth: AnalysisDepth::Standard,
            translation_detail: TranslationDetail::Basic,
            provider_id: None,
            provider_kind: None,
            provider_model: None,
            provider_endpoint: None,
            provider_api_key: None,
        }
    }

    async fn sample_queue() -> JobQueue {
        let db = DbClient::connect("file::memory:?cache=shared", None).await.expect("connect");
        JobQueue::new(Arc::new(db))
    }

    async fn sample_queue_with_db() -> (JobQueue, Arc<DbClient>) {
        let db = Arc::new(DbClient::connect("file::memory:?cache=shared", None).await.expect("connect"));
        (JobQueue::new(db.clone()), db)
    }

    /// Back-doors the back-off window so a requeued job can be re-leased
    /// immediately instead of waiting out `retry_backoff_seconds`.
    async fn force_job_eligible_now(db: &DbClient, job_id: Uuid) {
        let connection = db.get_connection().expect("connection");
        connection
            .execute(
                "UPDATE jobs SET next_eligible_at = '1970-01-01T00:00:00Z' WHERE id = ?1",
                libsql::params![job_id.to_string()],
            )
            .await
            .expect("force eligibility");
    }

    #[tokio::test]
    async fn submit_then_lease_returns_the_job_exactly_once() {
        let queue = sample_queue().await;
        let submitted = queue
            .submit(
                "fingerprint-a".to_string(),
                "blob-a".to_string(),
                "sample.bin".to_string(),
                sample_config(),
                JobPriority::Normal,
                "tenant-1".to_string(),
                None,
                None,
            )
            .await
            .expect("submit");

        let leased = queue.lease_next("worker-1").await.expect("lease").expect("some job");
        assert_eq!(leased.id, submitted.id);

        let empty = queue.lease_next("worker-2").await.expect("lease");
        assert!(empty.is_none());
    }

    #[tokio::test]
    async fn urgent_lane_is_served_before_normal() {
        let queue = sample_queue().await;
        queue
            .submit(
                "fp-normal".to_string(),
                "blob-normal".to_string(),
                "n.bin".to_string(),
                sample_config(),
                JobPriority::Normal,
                "tenant-1".to_string(),
                None,
                None,
            )
            .await
            .expect("submit normal");
        let urgent = queue
            .submit(
                "fp-urgent".to_string(),
                "blob-urgent".to_string(),
                "u.bin".to_string(),
                sample_config(),
                JobPriority::Urgent,
                "tenant-1".to_string(),
                None,
                None,
            )
            .await
            .expect("submit urgent");

        let leased = queue.lease_next("worker-1").await.expect("lease").expect("some job");
        assert_eq!(leased.id, urgent.id);
    }

    #[tokio::test]
    async fn fail_requeues_until_retry_budget_exhausted_then_dead_letters() {
        let (queue, db) = sample_queue_with_db().await;
        let submitted = queue
            .submit(
                "fp-retry".to_string(),
                "blob-retry".to_string(),
                "r.bin".to_string(),
                sample_config(),
                JobPriority::Normal,
                "tenant-1".to_string(),
                None,
                None,
            )
            .await
            .expect("submit");

        for _ in 0..3 {
            force_job_eligible_now(&db, submitted.id).await;
            let leased = queue.lease_next("worker-1").await.expect("lease").expect("job");
            assert_eq!(leased.id, submitted.id);
            let requeued = queue.fail(submitted.id, "worker-1", "transient failure").await.expect("fail");
            assert!(requeued);
        }

        force_job_eligible_now(&db, submitted.id).await;
        let leased = queue.lease_next("worker-1").await.expect("lease").expect("final attempt");
        let requeued = queue.fail(submitted.id, "worker-1", "final failure").await.expect("fail");
        assert!(!requeued);

        let stats = queue.stats().await.expect("stats");
        assert_eq!(stats.dead_letter_size, 1);
    }

    #[tokio::test]
    async fn cancel_targets_pending_jobs() {
        let queue = sample_queue().await;
        let submitted = queue
            .submit(
                "fp-cancel".to_string(),
                "blob-cancel".to_string(),
                "c.bin".to_string(),
                sample_config(),
                JobPriority::Low,
                "tenant-1".to_string(),
                None,
                None,
            )
            .await
            .expect("submit");

        let cancelled = queue.cancel(submitted.id).await.expect("cancel");
        assert!(cancelled);

        let job = queue.get(submitted.id).await.expect("get");
        assert_eq!(job.status, bin2nlp_domain_models::JobStatus::Cancelled);
    }
}
