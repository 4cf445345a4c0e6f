// [apps/orchestrator/src/handlers/mod.rs]
/*!
 * APARATO: ADAPTADORES HTTP DE ENTRADA
 * CLASIFICACION: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: TRADUCCION ENTRE EL CONTRATO HTTP Y LOS COMPONENTES
 * DE DOMINIO (C1-C8); NINGUNA REGLA DE NEGOCIO VIVE AQUI
 *
 * Autenticacion y autorizacion de tenant quedan explicitamente fuera de
 * alcance (ver Non-goals): el identificador de tenant llega en una
 * cabecera de confianza, asumiendo que algo delante de este proceso ya
 * lo valido.
 */

pub mod credentials;
pub mod jobs;
pub mod ops;

use axum::http::HeaderMap;

use crate::errors::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const TENANT_TIER_HEADER: &str = "x-tenant-tier";

pub(crate) fn default_tenant_tier() -> String {
    "standard".to_string()
}

pub(crate) fn tenant_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation(format!("missing required '{TENANT_HEADER}' header")))
}

pub(crate) fn tenant_tier(headers: &HeaderMap) -> String {
    headers
        .get(TENANT_TIER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(default_tenant_tier)
}
