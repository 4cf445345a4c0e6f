// [libs/domain/recovery-supervisor/src/lib.rs]
/*!
 * APARATO: RECOVERY SUPERVISOR (C8)
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: PRESUPUESTO DE TIEMPO POR OPERACION, CLASIFICACION DE
 * FALLOS Y REAPING PERIODICO DE ARRIENDOS VENCIDOS
 *
 * Envuelve cada invocacion de `PipelineExecutor::execute`. Dos relojes son
 * independientes: el presupuesto por operacion aqui (con extension hasta
 * un tope y un periodo de gracia cooperativo) y el back-off entre
 * reintentos que ya vive en C6 — este componente nunca duplica ese
 * calculo, solo decide cuando delegarselo via `JobQueue::fail`.
 */

pub mod errors;

use std::time::Duration;

use bin2nlp_domain_job_queue::JobQueue;
use bin2nlp_domain_models::{ClassifiedFailure, FailureCategory, Job, Severity};
use bin2nlp_domain_pipeline_executor::{CancellationFlag, ExecutionOutcome, ExecutorError, PipelineExecutor};
use tracing::{error, info, warn};

pub use errors::SupervisorError;

/// Per-operation time budget and its policy knobs.
#[derive(Debug, Clone)]
pub struct RecoverySupervisorConfig {
    pub default_timeout: Duration,
    pub max_timeout: Duration,
    pub warning_fraction: f64,
    pub grace_period: Duration,
    pub stale_lease_timeout: Duration,
}

impl Default for RecoverySupervisorConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(300),
            max_timeout: Duration::from_secs(1200),
            warning_fraction: 0.8,
            grace_period: Duration::from_secs(5),
            stale_lease_timeout: Duration::from_secs(3600),
        }
    }
}

/// How one leased job's supervision ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisionOutcome {
    /// Finished clean; `job_queue.complete` already committed.
    Completed,
    /// Finished from a salvage path with at least one successful artifact;
    /// `job_queue.complete` already committed the partial document.
    Salvaged,
    /// The attempt was abandoned and `JobQueue::fail` requeued it for a
    /// later attempt under C6's own back-off.
    Requeued,
    /// The attempt was abandoned and the retry budget was exhausted;
    /// `JobQueue::fail` dead-lettered it.
    DeadLettered,
    /// The job's terminal status was already set by an external cancel
    /// request before the executor could finish; nothing further to commit.
    CancelledExternally,
}

/// Retry budget honored *within a single lease*, distinct from C6's own
/// requeue-with-backoff budget (`bin2nlp_domain_models::MAX_RETRIES`).
const TRANSIENT_RETRY_BUDGET: u32 = 3;
const GENERIC_RETRY_BUDGET: u32 = 2;
const MAX_TIMEOUT_EXTENSIONS: u32 = 6;

pub struct RecoverySupervisor {
    config: RecoverySupervisorConfig,
}

impl RecoverySupervisor {
    pub fn new(config: RecoverySupervisorConfig) -> Self {
        Self { config }
    }

    /// Forcibly fails every processing job whose lease has gone stale,
    /// returning it to C6's retry/dead-letter logic. Intended to be driven
    /// from a periodic background tick.
    pub async fn reap_stale_leases(&self, job_queue: &JobQueue) -> Result<u64, SupervisorError> {
        Ok(job_queue.reap_stale_leases(self.config.stale_lease_timeout).await?)
    }

    /// Drives one leased job to completion, applying the per-operation
    /// timeout and failure-classification policy table.
    pub async fn supervise(
        &self,
        job: &Job,
        worker_id: &str,
        job_queue: &JobQueue,
        executor: &PipelineExecutor,
        cancellation: &CancellationFlag,
    ) -> Result<SupervisionOutcome, SupervisorError> {
        let mut effective_timeout = self.config.default_timeout;
        let mut transient_attempts = 0u32;
        let mut generic_attempts = 0u32;
        let mut timeout_extensions = 0u32;

        loop {
            let attempt = self.run_one_attempt(job, worker_id, job_queue, executor, cancellation, effective_timeout).await;

            match attempt {
                Attempt::Finished(Ok(outcome)) if !outcome.cancelled => {
                    return self.finalize_success(job, worker_id, job_queue, outcome).await;
                }
                Attempt::Finished(Ok(outcome)) if outcome.cancelled => {
                    info!(job_id = %job.id, "🚩 [recovery_supervisor]: job was cancelled externally before it finished");
                    return Ok(SupervisionOutcome::CancelledExternally);
                }
                Attempt::Finished(Ok(_)) => unreachable!("cancelled is exhaustively matched above"),
                Attempt::Finished(Err(executor_error)) => {
                    let category = classify(&executor_error);
                    self.record(job, category, executor_error.to_string());

                    match category {
                        FailureCategory::FormatError | FailureCategory::MemoryError => {
                            return self.abort(job, worker_id, job_queue, category).await;
                        }
                        FailureCategory::ConnectionError | FailureCategory::ProcessError => {
                            transient_attempts += 1;
                            if transient_attempts >= TRANSIENT_RETRY_BUDGET {
                                return self.abort(job, worker_id, job_queue, category).await;
                            }
                            warn!(job_id = %job.id, attempt = transient_attempts, "🔁 [recovery_supervisor]: retrying after a transient failure");
                        }
                        FailureCategory::Generic => {
                            generic_attempts += 1;
                            if generic_attempts >= GENERIC_RETRY_BUDGET {
                                return self.abort(job, worker_id, job_queue, category).await;
                            }
                            warn!(job_id = %job.id, "🔁 [recovery_supervisor]: retrying once after an unclassified failure");
                        }
                        FailureCategory::Timeout => {
                            if !self.extend_timeout_or_abort(&mut effective_timeout, &mut timeout_extensions) {
                                return self.abort(job, worker_id, job_queue, category).await;
                            }
                        }
                    }
                }
                Attempt::TimedOut { completeness: _ } => {
                    self.record(job, FailureCategory::Timeout, "deadline exceeded with no salvage available".to_string());
                    if !self.extend_timeout_or_abort(&mut effective_timeout, &mut timeout_extensions) {
                        return self.abort(job, worker_id, job_queue, FailureCategory::Timeout).await;
                    }
                }
                Attempt::TimedOutWithSalvage(outcome) => {
                    self.record(job, FailureCategory::Timeout, "deadline exceeded, salvage evaluated".to_string());
                    if outcome.completeness() >= bin2nlp_domain_pipeline_executor::SALVAGE_SUCCESS_THRESHOLD
                        && outcome.result_document.has_any_successful_artifact()
                    {
                        return self.finalize_success(job, worker_id, job_queue, outcome).await;
                    }
                    if !self.extend_timeout_or_abort(&mut effective_timeout, &mut timeout_extensions) {
                        return self.abort(job, worker_id, job_queue, FailureCategory::Timeout).await;
                    }
                }
            }
        }
    }

    async fn run_one_attempt(
        &self,
        job: &Job,
        worker_id: &str,
        job_queue: &JobQueue,
        executor: &PipelineExecutor,
        cancellation: &CancellationFlag,
        timeout: Duration,
    ) -> Attempt {
        let warning_at = timeout.mul_f64(self.config.warning_fraction);
        let job_id = job.id;
        let warning_handle = tokio::spawn(async move {
            tokio::time::sleep(warning_at).await;
            warn!(job_id = %job_id, "⏳ [recovery_supervisor]: operation approaching its time budget");
        });

        let execution = executor.execute(job, worker_id, job_queue, cancellation);
        tokio::pin!(execution);

        let result = match tokio::time::timeout(timeout, &mut execution).await {
            Ok(result) => {
                warning_handle.abort();
                return Attempt::Finished(result);
            }
            Err(_elapsed) => {
                warning_handle.abort();
                warn!(job_id = %job.id, timeout_secs = timeout.as_secs(), "⏱️  [recovery_supervisor]: per-operation timeout exceeded, requesting cooperative cancellation");
                cancellation.cancel();
                tokio::time::timeout(self.config.grace_period, &mut execution).await
            }
        };

        match result {
            Ok(Ok(outcome)) => Attempt::TimedOutWithSalvage(outcome),
            Ok(Err(_)) | Err(_) => Attempt::TimedOut { completeness: 0.0 },
        }
    }

    /// Applies the `Timeout` row of the policy table: extend up to the cap
    /// and signal "retry", or report the budget is exhausted.
    fn extend_timeout_or_abort(&self, effective_timeout: &mut Duration, extensions: &mut u32) -> bool {
        if *extensions >= MAX_TIMEOUT_EXTENSIONS || *effective_timeout >= self.config.max_timeout {
            return false;
        }
        *extensions += 1;
        let extended = effective_timeout.mul_f64(1.5);
        *effective_timeout = extended.min(self.config.max_timeout);
        true
    }

    async fn finalize_success(
        &self,
        job: &Job,
        worker_id: &str,
        job_queue: &JobQueue,
        outcome: ExecutionOutcome,
    ) -> Result<SupervisionOutcome, SupervisorError> {
        job_queue.complete(job.id, worker_id, &outcome.result_blob_ref).await?;
        if outcome.result_document.salvaged {
            Ok(SupervisionOutcome::Salvaged)
        } else {
            Ok(SupervisionOutcome::Completed)
        }
    }

    async fn abort(
        &self,
        job: &Job,
        worker_id: &str,
        job_queue: &JobQueue,
        category: FailureCategory,
    ) -> Result<SupervisionOutcome, SupervisorError> {
        let reason = format!("{category:?}");
        let requeued = job_queue.fail(job.id, worker_id, &reason).await?;
        if requeued {
            Ok(SupervisionOutcome::Requeued)
        } else {
            Ok(SupervisionOutcome::DeadLettered)
        }
    }

    fn record(&self, job: &Job, category: FailureCategory, message: String) {
        let failure = ClassifiedFailure {
            category,
            severity: category.default_severity(),
            message,
        };
        match failure.severity {
            Severity::Critical | Severity::High => {
                error!(job_id = %job.id, category = ?failure.category, severity = ?failure.severity, "💥 [recovery_supervisor]: {}", failure.message)
            }
            Severity::Medium | Severity::Low => {
                warn!(job_id = %job.id, category = ?failure.category, severity = ?failure.severity, "⚠️  [recovery_supervisor]: {}", failure.message)
            }
        }
    }
}

enum Attempt {
    Finished(Result<ExecutionOutcome, ExecutorError>),
    TimedOutWithSalvage(ExecutionOutcome),
    TimedOut { completeness: f64 },
}

/// Maps an executor failure onto the supervisor's recognized failure
/// categories. `MemoryError` has no producer in this stack
/// today — kept so the policy table stays exhaustive for future
/// instrumentation (e.g. a collaborator that reports OOM explicitly).
fn classify(error: &ExecutorError) -> FailureCategory {
    match error {
        ExecutorError::Decompiler(inner) => match inner {
            bin2nlp_infra_decompiler_client::DecompilerError::Timeout => FailureCategory::Timeout,
            bin2nlp_infra_decompiler_client::DecompilerError::SpawnFailed(_)
            | bin2nlp_infra_decompiler_client::DecompilerError::NonZeroExit(_, _) => FailureCategory::ProcessError,
            bin2nlp_infra_decompiler_client::DecompilerError::MalformedOutput(_) => FailureCategory::FormatError,
        },
        ExecutorError::Llm(inner) => match inner {
            bin2nlp_infra_llm_client::LlmClientError::Timeout => FailureCategory::Timeout,
            bin2nlp_infra_llm_client::LlmClientError::NetworkFault(_) => FailureCategory::ConnectionError,
            bin2nlp_infra_llm_client::LlmClientError::ProviderRejection(_) => FailureCategory::ConnectionError,
            bin2nlp_infra_llm_client::LlmClientError::DecodingFault(_) => FailureCategory::FormatError,
            bin2nlp_infra_llm_client::LlmClientError::ConfigurationInvalid(_) => FailureCategory::Generic,
        },
        ExecutorError::InputUnavailable(_) => FailureCategory::FormatError,
        ExecutorError::Vault(_) => FailureCategory::Generic,
        ExecutorError::Blob(_) | ExecutorError::JobQueue(_) | ExecutorError::Serialization(_) => FailureCategory::Generic,
        ExecutorError::NoProviderConfigured => FailureCategory::FormatError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_timeout_doubles_toward_the_cap_then_stops() {
        let supervisor = RecoverySupervisor::new(RecoverySupervisorConfig {
            default_timeout: Duration::from_secs(10),
            max_timeout: Duration::from_secs(20),
            warning_fraction: 0.8,
            grace_period: Duration::from_secs(1),
            stale_lease_timeout: Duration::from_secs(3600),
        });
        let mut timeout = Duration::from_secs(10);
        let mut extensions = 0;

        assert!(supervisor.extend_timeout_or_abort(&mut timeout, &mut extensions));
        assert_eq!(timeout, Duration::from_secs(15));

        assert!(supervisor.extend_timeout_or_abort(&mut timeout, &mut extensions));
        assert_eq!(timeout, Duration::from_secs(20));

        assert!(!supervisor.extend_timeout_or_abort(&mut timeout, &mut extensions));
    }

    #[test]
    fn classify_maps_decompiler_timeout_to_timeout_category() {
        let error = ExecutorError::Decompiler(bin2nlp_infra_decompiler_client::DecompilerError::Timeout);
        assert_eq!(classify(&error), FailureCategory::Timeout);
    }

    #[test]
    fn classify_maps_network_fault_to_connection_error() {
        // A malformed URL defers its parse error to `build()`, giving us a
        // genuine `reqwest::Error` without needing a live socket.
        let reqwest_error = reqwest::Client::new().get("not a valid url").build().unwrap_err();
        let error = ExecutorError::Llm(bin2nlp_infra_llm_client::LlmClientError::NetworkFault(reqwest_error));
        assert_eq!(classify(&error), FailureCategory::ConnectionError);
    }
}
