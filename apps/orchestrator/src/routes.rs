// [apps/orchestrator/src/routes.rs]
/*!
 * APARATO: TOPOLOGIA DE RUTAS
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: CABLEADO DE CADA ENDPOINT HTTP PUBLICO SOBRE `AppState`
 */

use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{credentials, jobs, ops};
use crate::middleware::health_guard;
use crate::state::AppState;

/// Builds the full router: job lifecycle, provider credentials, and
/// operational visibility endpoints, behind the maintenance-mode guard.
/// Authentication is out of scope (see Non-goals); perimeter access
/// control is assumed to live in front of this process.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            "x-tenant-id".parse::<HeaderName>().unwrap(),
            "x-tenant-tier".parse::<HeaderName>().unwrap(),
        ])
        .max_age(Duration::from_secs(3600));

    let jobs_routes = Router::new()
        .route("/api/v1/jobs", post(jobs::submit))
        .route("/api/v1/jobs/:id", get(jobs::status))
        .route("/api/v1/jobs/:id/cancel", post(jobs::cancel));

    let credential_routes = Router::new()
        .route("/api/v1/credentials", post(credentials::create).get(credentials::list))
        .route("/api/v1/credentials/:id", delete(credentials::deactivate));

    let ops_routes = Router::new()
        .route("/api/v1/queue/stats", get(ops::queue_stats))
        .route("/api/v1/rate-limits/status", get(ops::rate_limit_status))
        .route("/api/v1/workers", get(ops::workers));

    Router::new()
        .merge(jobs_routes)
        .merge(credential_routes)
        .merge(ops_routes)
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(state.clone(), health_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
