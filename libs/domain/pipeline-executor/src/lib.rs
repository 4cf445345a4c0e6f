// [libs/domain/pipeline-executor/src/lib.rs]
/*!
 * APARATO: PIPELINE EXECUTOR (C7)
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: EJECUCION DE UN JOB ARRENDADO A TRAVES DE STAGE A
 * (DECOMPILACION) Y STAGE B (TRADUCCION LLM POR ARTEFACTO)
 *
 * El ejecutor no posee el arriendo: lo recibe de `JobQueue::lease_next` y
 * reporta progreso a traves del mismo componente. La cancelacion es
 * cooperativa — se consulta una bandera compartida entre artefactos y en
 * cada limite de llamada externa.
 */

pub mod errors;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bin2nlp_core_credential_vault::CredentialVault;
use bin2nlp_domain_job_queue::JobQueue;
use bin2nlp_domain_models::{
    ArtifactDiagnostic, DecompilationDocument, FunctionTranslation, ImportTranslation, Job,
    LlmTranslations, ProviderKind, ResultDocument, StringTranslation,
};
use bin2nlp_domain_rate_limiter::RateLimiter;
use bin2nlp_domain_result_cache::ResultCache;
use bin2nlp_infra_blob_store::BlobStore;
use bin2nlp_infra_db::{CredentialRepository, DbClient};
use bin2nlp_infra_decompiler_client::DecompilationCollaborator;
use bin2nlp_infra_llm_client::{estimate_tokens_for_prompt, HttpLlmProvider, LlmProvider, ProviderBinding};
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub use errors::ExecutorError;

/// How long Stage A is allowed to take before the collaborator call itself
/// times out (separate from C8's overall per-operation budget).
const STAGE_A_TIMEOUT: Duration = Duration::from_secs(120);

/// Deadline applied to a single outbound LLM call.
const LLM_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-artifact coverage below which a salvaged job is reported as having
/// produced nothing usable — mirrors C8's own 0.5 salvage-completeness
/// threshold so both components agree on what "enough" means.
pub const SALVAGE_SUCCESS_THRESHOLD: f64 = 0.5;

/// A cooperative cancellation signal shared between the supervisor (or
/// whichever caller observes an external cancel request) and a running
/// executor invocation. Cheap to clone; all clones observe the same flag.
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The outcome of one `execute` call. `cancelled` is set when the executor
/// observed the cancellation flag and stopped early; the caller must not
/// treat that case as a normal completion (the job's terminal status was
/// already set by whatever issued the cancellation).
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub result_blob_ref: String,
    pub result_document: ResultDocument,
    pub cancelled: bool,
    pub attempted_artifacts: usize,
    pub total_artifacts: usize,
}

impl ExecutionOutcome {
    /// Fraction of artifacts that were attempted before a salvage point.
    /// `1.0` when there was nothing to attempt in the first place.
    pub fn completeness(&self) -> f64 {
        if self.total_artifacts == 0 {
            1.0
        } else {
            self.attempted_artifacts as f64 / self.total_artifacts as f64
        }
    }
}

pub struct PipelineExecutor {
    db: Arc<DbClient>,
    blobs: Arc<BlobStore>,
    decompiler: Arc<dyn DecompilationCollaborator>,
    rate_limiter: Arc<RateLimiter>,
    result_cache: Arc<ResultCache>,
    vault: Arc<CredentialVault>,
    http_client: reqwest::Client,
}

impl PipelineExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DbClient>,
        blobs: Arc<BlobStore>,
        decompiler: Arc<dyn DecompilationCollaborator>,
        rate_limiter: Arc<RateLimiter>,
        result_cache: Arc<ResultCache>,
        vault: Arc<CredentialVault>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            db,
            blobs,
            decompiler,
            rate_limiter,
            result_cache,
            vault,
            http_client,
        }
    }

    /// Resolves the LLM binding for this job: either a stored, tenant-owned
    /// credential (decrypted through the vault) or an inline override
    /// supplied on submission.
    async fn resolve_provider_binding(&self, job: &Job) -> Result<ProviderBinding, ExecutorError> {
        if let Some(provider_id) = &job.config.provider_id {
            let credential_id = Uuid::parse_str(provider_id)
                .map_err(|_| ExecutorError::NoProviderConfigured)?;
            let connection = self.db.get_connection().map_err(|e| ExecutorError::JobQueue(e.into()))?;
            let repository = CredentialRepository::new(connection);
            let credential = repository
                .get(credential_id)
                .await
                .map_err(|e| ExecutorError::JobQueue(e.into()))?;
            let api_key = self.vault.decrypt(&credential.encrypted_key)?;
            Ok(ProviderBinding {
                kind: credential.provider_kind,
                api_key,
                model: job.config.provider_model.clone().unwrap_or_else(|| "default".to_string()),
                endpoint: credential.endpoint_url.clone(),
            })
        } else {
            let kind = job.config.provider_kind.ok_or(ExecutorError::NoProviderConfigured)?;
            let api_key = job
                .config
                .provider_api_key
                .clone()
                .unwrap_or_default();
            Ok(ProviderBinding {
                kind,
                api_key,
                model: job.config.provider_model.clone().unwrap_or_else(|| "default".to_string()),
                endpoint: job.config.provider_endpoint.clone(),
            })
        }
    }

    fn provider_identifier(job: &Job, kind: ProviderKind) -> String {
        job.config
            .provider_id
            .clone()
            .unwrap_or_else(|| format!("{kind:?}").to_lowercase())
    }

    /// Consults C4 for a single outbound call, estimating cost up front.
    /// On rejection the caller records a per-artifact diagnostic and moves
    /// on rather than failing the whole job.
    async fn admit_llm_call(&self, tenant_id: &str, provider_identifier: &str, prompt: &str) -> Result<u32, String> {
        let estimate = estimate_tokens_for_prompt(prompt);
        let request_identifier = RateLimiter::llm_request_identifier(tenant_id, provider_identifier);
        let token_identifier = RateLimiter::llm_token_identifier(tenant_id, provider_identifier);

        match self.rate_limiter.check(&request_identifier, "llm", 1).await {
            Ok(bin2nlp_domain_models::AdmitDecision::Rejected { retry_after_seconds }) => {
                return Err(format!("llm request rate limit exceeded, retry after {retry_after_seconds}s"));
            }
            Err(error) => warn!("⚠️  [pipeline_executor]: rate limiter unavailable for request gate: {error}"),
            _ => {}
        }

        match self.rate_limiter.check(&token_identifier, "llm", estimate as u64).await {
            Ok(bin2nlp_domain_models::AdmitDecision::Rejected { retry_after_seconds }) => {
                Err(format!("llm token budget exceeded, retry after {retry_after_seconds}s"))
            }
            Err(error) => {
                warn!("⚠️  [pipeline_executor]: rate limiter unavailable for token gate: {error}");
                Ok(estimate)
            }
            _ => Ok(estimate),
        }
    }

    /// True up the token counter with the provider's actually reported
    /// usage once it exceeds the pre-call estimate (7: "actual
    /// counts are recorded post-hoc"). Best-effort; a rate-limiter fault
    /// here never fails the artifact.
    async fn record_actual_usage(&self, tenant_id: &str, provider_identifier: &str, estimate: u32, actual_total: u32) {
        if actual_total <= estimate {
            return;
        }
        let token_identifier = RateLimiter::llm_token_identifier(tenant_id, provider_identifier);
        if let Err(error) = self
            .rate_limiter
            .check(&token_identifier, "llm", (actual_total - estimate) as u64)
            .await
        {
            warn!("⚠️  [pipeline_executor]: failed to true up token usage: {error}");
        }
    }

    /// Drives a leased job through Stage A then Stage B, reporting progress
    /// through `job_queue` as it goes. Returns early with
    /// `ExecutionOutcome::cancelled = true` if `cancellation` is observed
    /// before the job finishes.
    #[instrument(skip(self, job, job_queue, cancellation), fields(job_id = %job.id))]
    pub async fn execute(
        &self,
        job: &Job,
        worker_id: &str,
        job_queue: &JobQueue,
        cancellation: &CancellationFlag,
    ) -> Result<ExecutionOutcome, ExecutorError> {
        let started_at = Utc::now();

        job_queue.update_progress(job.id, worker_id, 10, Some("decompiling")).await?;

        let input_bytes = self
            .blobs
            .get(&job.input_blob_ref)
            .await?
            .ok_or_else(|| ExecutorError::InputUnavailable(job.input_blob_ref.clone()))?;

        let workdir = tempfile::tempdir().map_err(|e| ExecutorError::InputUnavailable(e.to_string()))?;
        let input_path = workdir.path().join(&job.original_filename);
        tokio::fs::write(&input_path, &input_bytes)
            .await
            .map_err(|e| ExecutorError::InputUnavailable(e.to_string()))?;

        let decompilation = self
            .decompiler
            .analyze(&input_path, job.config.analysis_depth.collaborator_dial(), STAGE_A_TIMEOUT)
            .await?;

        job_queue.update_progress(job.id, worker_id, 70, Some("translating")).await?;

        if cancellation.is_cancelled() {
            let total = decompilation_artifact_total(&decompilation, job);
            return self
                .salvage(job, &decompilation, started_at, Vec::new(), Vec::new(), Vec::new(), None, 0, &total)
                .await;
        }

        if !job.config.has_provider_configured() {
            job_queue.update_progress(job.id, worker_id, 90, Some("finalizing")).await?;
            let duration_seconds = (Utc::now() - started_at).num_milliseconds() as f64 / 1000.0;
            let result_document = ResultDocument::new_success(
                decompilation.decompilation_id,
                decompilation.function_count(),
                decompilation.import_count(),
                decompilation.string_count(),
                duration_seconds,
                None,
            );
            let result_blob_ref = self.write_result(job.id, &result_document, job.config.analysis_depth.ttl_multiplier()).await?;
            self.index_in_result_cache(job, &result_document, "none", &result_blob_ref).await;
            job_queue.update_progress(job.id, worker_id, 100, Some("finalizing")).await?;
            info!(job_id = %job.id, "✅ [pipeline_executor]: decompilation-only job finished, no provider configured");
            return Ok(ExecutionOutcome {
                result_blob_ref,
                result_document,
                cancelled: false,
                attempted_artifacts: 0,
                total_artifacts: 0,
            });
        }

        let binding = self.resolve_provider_binding(job).await?;
        let provider = HttpLlmProvider::new(self.http_client.clone(), binding.clone())?;
        let provider_identifier = Self::provider_identifier(job, binding.kind);

        let total_artifacts = decompilation_artifact_total(&decompilation, job);
        let mut attempted = 0usize;
        let mut diagnostics = Vec::new();

        let mut functions = Vec::with_capacity(decompilation.functions.len());
        for function in &decompilation.functions {
            if cancellation.is_cancelled() {
                return self
                    .salvage(job, &decompilation, started_at, functions, Vec::new(), Vec::new(), None, attempted, &total_artifacts)
                    .await;
            }
            attempted += 1;
            let prompt = format!(
                "Explain in plain language what this decompiled function does.\nName: {}\nDisassembly:\n{}\nPseudocode:\n{}",
                function.name,
                function.disassembly,
                function.pseudocode.as_deref().unwrap_or("(unavailable)"),
            );
            match self.admit_llm_call(&job.tenant_id, &provider_identifier, &prompt).await {
                Ok(estimate) => match provider.generate(&prompt, estimate.max(256), LLM_CALL_TIMEOUT).await {
                    Ok(completion) => {
                        self.record_actual_usage(&job.tenant_id, &provider_identifier, estimate, completion.input_tokens + completion.output_tokens)
                            .await;
                        functions.push(FunctionTranslation {
                            name: function.name.clone(),
                            address: function.entry_address.clone(),
                            natural_language: completion.text.trim().to_string(),
                            purpose: None,
                            parameters: Vec::new(),
                            return_value: None,
                        });
                    }
                    Err(error) => diagnostics.push(ArtifactDiagnostic {
                        artifact_kind: "function".to_string(),
                        artifact_name: function.name.clone(),
                        error_class: "provider_unavailable".to_string(),
                        message: error.to_string(),
                    }),
                },
                Err(reason) => diagnostics.push(ArtifactDiagnostic {
                    artifact_kind: "function".to_string(),
                    artifact_name: function.name.clone(),
                    error_class: "rate_limited".to_string(),
                    message: reason,
                }),
            }
        }

        let mut imports = Vec::new();
        if job.config.translation_detail.includes_imports() {
            for import in &decompilation.imports {
                if cancellation.is_cancelled() {
                    return self
                        .salvage(job, &decompilation, started_at, functions, imports, Vec::new(), None, attempted, &total_artifacts)
                        .await;
                }
                attempted += 1;
                let prompt = format!(
                    "Explain in plain language why a binary would import `{}` from `{}`.",
                    import.symbol, import.library
                );
                match self.admit_llm_call(&job.tenant_id, &provider_identifier, &prompt).await {
                    Ok(estimate) => match provider.generate(&prompt, estimate.max(128), LLM_CALL_TIMEOUT).await {
                        Ok(completion) => {
                            self.record_actual_usage(&job.tenant_id, &provider_identifier, estimate, completion.input_tokens + completion.output_tokens)
                                .await;
                            imports.push(ImportTranslation {
                                library: import.library.clone(),
                                function: import.symbol.clone(),
                                purpose: completion.text.trim().to_string(),
                            });
                        }
                        Err(error) => diagnostics.push(ArtifactDiagnostic {
                            artifact_kind: "import".to_string(),
                            artifact_name: format!("{}!{}", import.library, import.symbol),
                            error_class: "provider_unavailable".to_string(),
                            message: error.to_string(),
                        }),
                    },
                    Err(reason) => diagnostics.push(ArtifactDiagnostic {
                        artifact_kind: "import".to_string(),
                        artifact_name: format!("{}!{}", import.library, import.symbol),
                        error_class: "rate_limited".to_string(),
                        message: reason,
                    }),
                }
            }
        }

        let mut strings = Vec::new();
        let mut overall_summary = None;
        if job.config.translation_detail.includes_strings_and_summary() {
            for extracted in &decompilation.strings {
                if cancellation.is_cancelled() {
                    return self
                        .salvage(job, &decompilation, started_at, functions, imports, strings, None, attempted, &total_artifacts)
                        .await;
                }
                attempted += 1;
                let prompt = format!("Explain the likely significance of this extracted string: \"{}\"", extracted.content);
                match self.admit_llm_call(&job.tenant_id, &provider_identifier, &prompt).await {
                    Ok(estimate) => match provider.generate(&prompt, estimate.max(64), LLM_CALL_TIMEOUT).await {
                        Ok(completion) => {
                            self.record_actual_usage(&job.tenant_id, &provider_identifier, estimate, completion.input_tokens + completion.output_tokens)
                                .await;
                            strings.push(StringTranslation {
                                content: extracted.content.clone(),
                                address: extracted.address.clone(),
                                natural_language: completion.text.trim().to_string(),
                            });
                        }
                        Err(error) => diagnostics.push(ArtifactDiagnostic {
                            artifact_kind: "string".to_string(),
                            artifact_name: extracted.address.clone(),
                            error_class: "provider_unavailable".to_string(),
                            message: error.to_string(),
                        }),
                    },
                    Err(reason) => diagnostics.push(ArtifactDiagnostic {
                        artifact_kind: "string".to_string(),
                        artifact_name: extracted.address.clone(),
                        error_class: "rate_limited".to_string(),
                        message: reason,
                    }),
                }
            }

            if !cancellation.is_cancelled() {
                let prompt = format!(
                    "Provide one paragraph summarizing the overall purpose of a binary with {} functions, {} imports and {} extracted strings.",
                    decompilation.function_count(),
                    decompilation.import_count(),
                    decompilation.string_count(),
                );
                if let Ok(estimate) = self.admit_llm_call(&job.tenant_id, &provider_identifier, &prompt).await {
                    if let Ok(completion) = provider.generate(&prompt, estimate.max(256), LLM_CALL_TIMEOUT).await {
                        self.record_actual_usage(&job.tenant_id, &provider_identifier, estimate, completion.input_tokens + completion.output_tokens)
                            .await;
                        overall_summary = Some(completion.text.trim().to_string());
                    }
                }
            }
        }

        job_queue.update_progress(job.id, worker_id, 90, Some("translating")).await?;

        let duration_seconds = (Utc::now() - started_at).num_milliseconds() as f64 / 1000.0;
        let translations = LlmTranslations {
            functions,
            imports,
            strings,
            overall_summary,
        };

        let mut result_document = ResultDocument::new_success(
            decompilation.decompilation_id,
            decompilation.function_count(),
            decompilation.import_count(),
            decompilation.string_count(),
            duration_seconds,
            Some(translations),
        );
        result_document.diagnostics = diagnostics;
        result_document.success = result_document.has_any_successful_artifact() || total_artifacts == 0;
        // §8 scenario 5: every artifact failed against the provider (e.g. an
        // unreachable endpoint) while decompilation itself succeeded — still
        // a completed job, flagged salvaged since no translation survived.
        result_document.salvaged = total_artifacts > 0 && !result_document.has_any_successful_artifact();

        let result_blob_ref = self.write_result(job.id, &result_document, job.config.analysis_depth.ttl_multiplier()).await?;

        self.index_in_result_cache(job, &result_document, &provider_identifier, &result_blob_ref).await;

        job_queue.update_progress(job.id, worker_id, 100, Some("finalizing")).await?;

        info!(job_id = %job.id, attempted, total_artifacts, "✅ [pipeline_executor]: job translation finished");

        Ok(ExecutionOutcome {
            result_blob_ref,
            result_document,
            cancelled: false,
            attempted_artifacts: attempted,
            total_artifacts,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn salvage(
        &self,
        job: &Job,
        decompilation: &DecompilationDocument,
        started_at: chrono::DateTime<Utc>,
        functions: Vec<FunctionTranslation>,
        imports: Vec<ImportTranslation>,
        strings: Vec<StringTranslation>,
        overall_summary: Option<String>,
        attempted: usize,
        total_artifacts: &usize,
    ) -> Result<ExecutionOutcome, ExecutorError> {
        warn!(job_id = %job.id, "🚩 [pipeline_executor]: cancellation observed, salvaging partial translation");
        let duration_seconds = (Utc::now() - started_at).num_milliseconds() as f64 / 1000.0;
        let has_any = !functions.is_empty() || !imports.is_empty() || !strings.is_empty();
        let translations = if has_any {
            Some(LlmTranslations {
                functions,
                imports,
                strings,
                overall_summary,
            })
        } else {
            None
        };

        let mut result_document = ResultDocument::new_success(
            decompilation.decompilation_id,
            decompilation.function_count(),
            decompilation.import_count(),
            decompilation.string_count(),
            duration_seconds,
            translations,
        );
        result_document.salvaged = true;
        result_document.success = result_document.has_any_successful_artifact();

        let result_blob_ref = self.write_result(job.id, &result_document, job.config.analysis_depth.ttl_multiplier()).await?;

        Ok(ExecutionOutcome {
            result_blob_ref,
            result_document,
            cancelled: true,
            attempted_artifacts: attempted,
            total_artifacts: *total_artifacts,
        })
    }

    /// Indexes a freshly completed (non-salvaged) translation into C5 so an
    /// identical `(file_fingerprint, config)` submission is served from
    /// cache next time. Best-effort: a cache-store fault never fails the
    /// job, it only means the next identical submission re-runs the
    /// pipeline.
    async fn index_in_result_cache(
        &self,
        job: &Job,
        document: &ResultDocument,
        provider_identifier: &str,
        result_blob_ref: &str,
    ) {
        if document.salvaged || !document.success {
            return;
        }
        let mut produced = Vec::new();
        if let Some(translations) = &document.llm_translations {
            if !translations.functions.is_empty() {
                produced.push("functions");
            }
            if !translations.imports.is_empty() {
                produced.push("imports");
            }
            if !translations.strings.is_empty() {
                produced.push("strings");
            }
            if translations.overall_summary.is_some() {
                produced.push("summary");
            }
        }
        if let Err(error) = self
            .result_cache
            .set(&job.file_fingerprint, &job.config, result_blob_ref.to_string(), Some(provider_identifier), &produced)
            .await
        {
            warn!(job_id = %job.id, "⚠️  [pipeline_executor]: failed to index completed translation in the result cache: {}", error);
        }
    }

    async fn write_result(&self, job_id: Uuid, document: &ResultDocument, ttl_multiplier: f64) -> Result<String, ExecutorError> {
        let key = format!("result:{job_id}");
        let bytes = serde_json::to_vec(document)?;
        let ttl_seconds = (24 * 3600) as f64 * ttl_multiplier;
        self.blobs.put(&key, bytes, chrono::Duration::seconds(ttl_seconds as i64)).await?;
        Ok(key)
    }
}

fn decompilation_artifact_total(decompilation: &DecompilationDocument, job: &Job) -> usize {
    let mut total = decompilation.function_count();
    if job.config.translation_detail.includes_imports() {
        total += decompilation.import_count();
    }
    if job.config.translation_detail.includes_strings_and_summary() {
        total += decompilation.string_count();
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use bin2nlp_domain_models::{AnalysisDepth, FileMetadata, JobConfig, JobPriority, TranslationDetail};

    fn sample_document() -> DecompilationDocument {
        DecompilationDocument {
            decompilation_id: Uuid::new_v4(),
            functions: vec![
                bin2nlp_domain_models::DecompiledFunction {
                    name: "main".to_string(),
                    entry_address: "0x1000".to_string(),
                    size_bytes: 64,
                    disassembly: "nop".to_string(),
                    pseudocode: None,
                    call_targets: vec![],
                },
                bin2nlp_domain_models::DecompiledFunction {
                    name: "helper".to_string(),
                    entry_address: "0x2000".to_string(),
                    size_bytes: 32,
                    disassembly: "ret".to_string(),
                    pseudocode: None,
                    call_targets: vec![],
                },
            ],
            imports: vec![],
            strings: vec![],
            file_metadata: FileMetadata {
                format: "elf".to_string(),
                architecture: "x86_64".to_string(),
                size_bytes: 2048,
                entry_point: Some("0x1000".to_string()),
            },
        }
    }

    fn sample_job(translation_detail: TranslationDetail) -> Job {
        Job::new_pending(
            "fingerprint".to_string(),
            "blob-ref".to_string(),
            "sample.bin".to_string(),
            JobConfig {
                analysis_depth: AnalysisDepth::Standard,
                translation_detail,
                provider_id: None,
                provider_kind: None,
                provider_model: None,
                provider_endpoint: None,
                provider_api_key: None,
            },
            JobPriority::Normal,
            "tenant-1".to_string(),
            None,
            None,
        )
    }

    #[test]
    fn artifact_total_counts_functions_only_for_basic_detail() {
        let document = sample_document();
        let job = sample_job(TranslationDetail::Basic);
        assert_eq!(decompilation_artifact_total(&document, &job), 2);
    }

    #[test]
    fn job_with_no_provider_configured_is_not_flagged_as_having_one() {
        let job = sample_job(TranslationDetail::Basic);
        assert!(!job.config.has_provider_configured());
    }

    #[test]
    fn cancellation_flag_is_observed_across_clones() {
        let flag = CancellationFlag::new();
        let cloned = flag.clone();
        assert!(!cloned.is_cancelled());
        flag.cancel();
        assert!(cloned.is_cancelled());
    }

    #[test]
    fn completeness_is_full_when_nothing_was_expected() {
        let outcome = ExecutionOutcome {
            result_blob_ref: "result:x".to_string(),
            result_document: ResultDocument::new_success(Uuid::new_v4(), 0, 0, 0, 1.0, None),
            cancelled: true,
            attempted_artifacts: 0,
            total_artifacts: 0,
        };
        assert_eq!(outcome.completeness(), 1.0);
    }

    #[test]
    fn completeness_reflects_partial_progress() {
        let outcome = ExecutionOutcome {
            result_blob_ref: "result:x".to_string(),
            result_document: ResultDocument::new_success(Uuid::new_v4(), 4, 0, 0, 1.0, None),
            cancelled: true,
            attempted_artifacts: 2,
            total_artifacts: 4,
        };
        assert_eq!(outcome.completeness(), 0.5);
    }
}
