// [apps/orchestrator/src/handlers/ops.rs]
/*!
 * APARATO: ADAPTADOR HTTP - OPERACIONES Y VISIBILIDAD
 * CLASIFICACION: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: ESTADISTICAS DE COLA, ESTADO DE RATE-LIMIT Y
 * VISIBILIDAD DE WORKERS — SIN AUTENTICACION, PENSADO PARA CONSUMO
 * OPERATIVO INTERNO (PANEL, SCRAPER)
 */

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use bin2nlp_domain_models::QueueStats;
use bin2nlp_infra_db::WorkerRepository;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::errors::ApiError;
use crate::handlers::{tenant_id, tenant_tier};
use crate::state::AppState;

/// `GET /api/v1/queue/stats` — per-lane pending depth, processing count,
/// dead-letter size and rolling completed/failed counters.
#[instrument(skip(state))]
pub async fn queue_stats(State(state): State<AppState>) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.job_queue.stats().await?))
}

#[derive(Deserialize)]
pub struct RateLimitStatusQuery {
    /// Defaults to the caller's own tenant id; an explicit identifier lets
    /// operators probe the reserved `llm` gating identifiers too.
    identifier: Option<String>,
}

/// `GET /api/v1/rate-limits/status` — limit/used/remaining/reset_at for
/// every accounting window.
#[instrument(skip(state, headers))]
pub async fn rate_limit_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RateLimitStatusQuery>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_id(&headers)?;
    let tier = tenant_tier(&headers);
    let identifier = query.identifier.unwrap_or(tenant);
    let windows = state.rate_limiter.status(&identifier, &tier).await?;
    Ok(Json(json!({ "identifier": identifier, "windows": windows })))
}

/// `GET /api/v1/workers` — liveness snapshot independent of job leases, so
/// idle workers in the fleet stay observable too.
#[instrument(skip(state))]
pub async fn workers(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let connection = state.db.get_connection().map_err(ApiError::from)?;
    let repository = WorkerRepository::new(connection);
    let now = chrono::Utc::now();
    let heartbeats = repository
        .list_active_workers(now, state.config.heartbeat_timeout.as_secs() as i64)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(json!({ "workers": heartbeats })))
}
