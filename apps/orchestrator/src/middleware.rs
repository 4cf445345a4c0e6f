// [apps/orchestrator/src/middleware.rs]
/*!
 * APARATO: GUARDIA DE SALUD
 * CLASIFICACION: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: BLOQUEO DE TRAFICO MIENTRAS EL SISTEMA ESTA EN MANTENIMIENTO
 */

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// Rejects every request with `503` while the operator has flipped
/// `maintenance_mode`. Authentication is explicitly out of scope for this
/// service; perimeter access control is assumed to live in front of it.
pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.is_in_maintenance() {
        warn!("⛔ [middleware]: request rejected, service is in maintenance mode");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "maintenance_mode_active",
                "retry_after_seconds": 60,
            })),
        )
            .into_response();
    }
    next.run(req).await
}
