// [apps/orchestrator/src/handlers/jobs.rs]
/*!
 * APARATO: ADAPTADOR HTTP - CICLO DE VIDA DE JOBS
 * CLASIFICACION: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: SUBMIT / STATUS / CANCEL SOBRE EL CONTRATO PUBLICO
 */

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use bin2nlp_domain_models::{AnalysisDepth, JobConfig, JobPriority, JobStatus, ProviderKind, ResultDocument, TranslationDetail};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::handlers::{tenant_id, tenant_tier};
use crate::state::AppState;

/// Generous ceiling on how long an uploaded input stays resident in C2
/// while its job is queued and processed. Independent of the result
/// cache's own TTL, which is keyed by analysis depth instead.
fn input_blob_ttl() -> chrono::Duration {
    chrono::Duration::hours(24)
}

#[derive(Default)]
struct SubmitForm {
    file_bytes: Option<Vec<u8>>,
    filename: Option<String>,
    analysis_depth: Option<String>,
    translation_detail: Option<String>,
    priority: Option<String>,
    provider_id: Option<String>,
    provider_kind: Option<String>,
    provider_model: Option<String>,
    provider_endpoint: Option<String>,
    provider_api_key: Option<String>,
    callback_url: Option<String>,
    correlation_id: Option<String>,
}

async fn read_multipart_form(mut multipart: Multipart) -> Result<SubmitForm, ApiError> {
    let mut form = SubmitForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.filename = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("failed reading uploaded file: {e}")))?;
                form.file_bytes = Some(bytes.to_vec());
            }
            other => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("failed reading field '{other}': {e}")))?;
                let text = if text.is_empty() { None } else { Some(text) };
                match other {
                    "analysis_depth" => form.analysis_depth = text,
                    "translation_detail" => form.translation_detail = text,
                    "priority" => form.priority = text,
                    "provider_id" => form.provider_id = text,
                    "provider_kind" => form.provider_kind = text,
                    "provider_model" => form.provider_model = text,
                    "provider_endpoint" => form.provider_endpoint = text,
                    "provider_api_key" => form.provider_api_key = text,
                    "callback_url" => form.callback_url = text,
                    "correlation_id" => form.correlation_id = text,
                    _ => {
                        warn!(field = other, "⚠️  [handlers::jobs]: unrecognized submission field, discarded");
                    }
                }
            }
        }
    }

    Ok(form)
}

fn parse_analysis_depth(value: &Option<String>) -> Result<AnalysisDepth, ApiError> {
    match value.as_deref() {
        None => Ok(AnalysisDepth::Standard),
        Some("quick") | Some("basic") => Ok(AnalysisDepth::Quick),
        Some("standard") => Ok(AnalysisDepth::Standard),
        Some("comprehensive") => Ok(AnalysisDepth::Comprehensive),
        Some("deep") => Ok(AnalysisDepth::Deep),
        Some(other) => Err(ApiError::validation(format!("unrecognized analysis_depth '{other}'"))),
    }
}

fn parse_translation_detail(value: &Option<String>) -> Result<TranslationDetail, ApiError> {
    match value.as_deref() {
        None => Ok(TranslationDetail::Basic),
        Some("basic") => Ok(TranslationDetail::Basic),
        Some("standard") => Ok(TranslationDetail::Standard),
        Some("detailed") => Ok(TranslationDetail::Detailed),
        Some(other) => Err(ApiError::validation(format!("unrecognized translation_detail '{other}'"))),
    }
}

fn parse_provider_kind(value: &Option<String>) -> Result<Option<ProviderKind>, ApiError> {
    match value.as_deref() {
        None => Ok(None),
        Some("openai") => Ok(Some(ProviderKind::Openai)),
        Some("anthropic") => Ok(Some(ProviderKind::Anthropic)),
        Some("gemini") => Ok(Some(ProviderKind::Gemini)),
        Some("ollama") => Ok(Some(ProviderKind::Ollama)),
        Some(other) => Err(ApiError::validation(format!("unrecognized provider_kind '{other}'"))),
    }
}

fn parse_priority(value: &Option<String>) -> Result<JobPriority, ApiError> {
    match value.as_deref() {
        None => Ok(JobPriority::Normal),
        Some(raw) => JobPriority::parse(raw).ok_or_else(|| ApiError::validation(format!("unrecognized priority '{raw}'"))),
    }
}

/// `POST /api/v1/jobs` — accepts a multipart upload, admits it against C4,
/// serves it immediately from C5 on a cache hit, otherwise persists the
/// input to C2 and enqueues it in C6.
#[instrument(skip(state, headers, multipart))]
pub async fn submit(State(state): State<AppState>, headers: HeaderMap, multipart: Multipart) -> Result<Json<Value>, ApiError> {
    let tenant_id = tenant_id(&headers)?;
    let tier = tenant_tier(&headers);

    let form = read_multipart_form(multipart).await?;
    let file_bytes = form.file_bytes.ok_or_else(|| ApiError::validation("multipart body is missing the 'file' field"))?;
    let filename = form.filename.unwrap_or_else(|| "upload.bin".to_string());

    if file_bytes.is_empty() {
        return Err(ApiError::validation("uploaded file is empty"));
    }
    if file_bytes.len() as u64 > state.config.max_upload_size_bytes {
        return Err(ApiError::validation(format!(
            "uploaded file of {} bytes exceeds the {} byte limit",
            file_bytes.len(),
            state.config.max_upload_size_bytes
        )));
    }

    let decision = state.rate_limiter.check(&tenant_id, &tier, 1).await?;
    if let bin2nlp_domain_models::AdmitDecision::Rejected { retry_after_seconds } = decision {
        return Err(ApiError::new(
            bin2nlp_domain_models::ErrorClass::RateLimited,
            format!("submission rate limit exceeded, retry after {retry_after_seconds}s"),
        ));
    }

    let config = JobConfig {
        analysis_depth: parse_analysis_depth(&form.analysis_depth)?,
        translation_detail: parse_translation_detail(&form.translation_detail)?,
        provider_id: form.provider_id,
        provider_kind: parse_provider_kind(&form.provider_kind)?,
        provider_model: form.provider_model,
        provider_endpoint: form.provider_endpoint,
        provider_api_key: form.provider_api_key,
    };
    let priority = parse_priority(&form.priority)?;

    let file_fingerprint = hex::encode(Sha256::digest(&file_bytes));
    let input_blob_ref = format!("input/{file_fingerprint}");
    state.blobs.put(&input_blob_ref, file_bytes, input_blob_ttl()).await?;

    if let Some(cached) = state.result_cache.get(&file_fingerprint, &config).await? {
        let job = state
            .job_queue
            .submit(
                file_fingerprint,
                input_blob_ref,
                filename,
                config,
                priority,
                tenant_id,
                form.callback_url,
                form.correlation_id,
            )
            .await?;
        state.job_queue.complete_from_cache(job.id, &cached.result_blob_ref).await?;
        info!(job_id = %job.id, "⚡ [handlers::jobs]: served from cache on submission");
        return Ok(Json(json!({
            "job_id": job.id,
            "status": "completed",
            "served_from_cache": true,
        })));
    }

    let job = state
        .job_queue
        .submit(
            file_fingerprint,
            input_blob_ref,
            filename,
            config,
            priority,
            tenant_id,
            form.callback_url,
            form.correlation_id,
        )
        .await?;

    info!(job_id = %job.id, "📥 [handlers::jobs]: job accepted");
    Ok(Json(json!({
        "job_id": job.id,
        "status": "pending",
        "served_from_cache": false,
    })))
}

#[derive(Serialize)]
struct JobStatusResponse {
    job_id: Uuid,
    status: JobStatus,
    progress_percentage: u8,
    current_stage: Option<String>,
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ResultDocument>,
}

/// `GET /api/v1/jobs/:id` — current lifecycle snapshot, with the merged
/// result document attached once the job has completed.
#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> Result<Json<JobStatusResponse>, ApiError> {
    let job = state.job_queue.get(job_id).await?;

    let result = if job.status == JobStatus::Completed {
        match &job.result_blob_ref {
            Some(reference) => match state.blobs.get(reference).await? {
                Some(bytes) => Some(
                    serde_json::from_slice(&bytes)
                        .map_err(|e| ApiError::internal(format!("stored result document is malformed: {e}")))?,
                ),
                None => None,
            },
            None => None,
        }
    } else {
        None
    };

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status,
        progress_percentage: job.progress_percentage,
        current_stage: job.current_stage,
        error_message: job.error_message,
        result,
    }))
}

/// `POST /api/v1/jobs/:id/cancel` — marks a still-pending row cancelled
/// outright, and signals any in-flight worker so a processing job
/// observes the cancellation at its next suspension point.
#[instrument(skip(state))]
pub async fn cancel(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let cancelled_while_pending = state.job_queue.cancel(job_id).await?;
    let signalled_in_flight = state.in_flight.signal(job_id);

    if !cancelled_while_pending && !signalled_in_flight {
        return Err(ApiError::validation("job is not cancellable in its current state"));
    }

    info!(job_id = %job_id, cancelled_while_pending, signalled_in_flight, "🛑 [handlers::jobs]: cancellation requested");
    Ok(Json(json!({ "job_id": job_id, "accepted": true })))
}
