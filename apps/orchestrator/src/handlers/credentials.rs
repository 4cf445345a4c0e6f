// [apps/orchestrator/src/handlers/credentials.rs]
/*!
 * APARATO: ADAPTADOR HTTP - CREDENCIALES DE PROVEEDOR
 * CLASIFICACION: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: CRUD TENANT-SCOPED SOBRE C1/C3, NUNCA EXPONIENDO
 * LA CLAVE EN TEXTO PLANO UNA VEZ SELLADA
 */

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use bin2nlp_domain_models::{config::ProviderKind, ProviderCredential};
use bin2nlp_infra_db::CredentialRepository;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::handlers::tenant_id;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCredentialRequest {
    pub display_name: String,
    pub provider_kind: String,
    pub api_key: String,
    pub endpoint_url: Option<String>,
}

#[derive(Serialize)]
pub struct CredentialSummary {
    pub id: Uuid,
    pub display_name: String,
    pub provider_kind: String,
    pub endpoint_url: Option<String>,
    pub active: bool,
}

impl From<ProviderCredential> for CredentialSummary {
    fn from(credential: ProviderCredential) -> Self {
        Self {
            id: credential.id,
            display_name: credential.display_name,
            provider_kind: format!("{:?}", credential.provider_kind).to_lowercase(),
            endpoint_url: credential.endpoint_url,
            active: credential.active,
        }
    }
}

fn parse_provider_kind(raw: &str) -> Result<ProviderKind, ApiError> {
    match raw {
        "openai" => Ok(ProviderKind::Openai),
        "anthropic" => Ok(ProviderKind::Anthropic),
        "gemini" => Ok(ProviderKind::Gemini),
        "ollama" => Ok(ProviderKind::Ollama),
        other => Err(ApiError::validation(format!("unrecognized provider_kind '{other}'"))),
    }
}

/// `POST /api/v1/credentials` — seals the supplied key through C3 and
/// persists the ciphertext; the plaintext key never survives this call.
#[instrument(skip(state, headers, body))]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCredentialRequest>,
) -> Result<Json<CredentialSummary>, ApiError> {
    let tenant = tenant_id(&headers)?;
    let kind = parse_provider_kind(&body.provider_kind)?;

    if kind.requires_endpoint() && body.endpoint_url.as_deref().unwrap_or("").is_empty() {
        return Err(ApiError::validation("self-hosted providers require a non-empty endpoint_url"));
    }
    if body.api_key.trim().is_empty() {
        return Err(ApiError::validation("api_key must not be empty"));
    }

    let encrypted_key = state.vault.encrypt(&body.api_key)?;

    let credential = ProviderCredential {
        id: Uuid::new_v4(),
        tenant_id: tenant,
        display_name: body.display_name,
        provider_kind: kind,
        encrypted_key,
        endpoint_url: body.endpoint_url,
        config: json!({}),
        active: true,
    };

    let connection = state.db.get_connection().map_err(ApiError::from)?;
    CredentialRepository::new(connection).insert(&credential).await.map_err(ApiError::from)?;

    Ok(Json(credential.into()))
}

/// `GET /api/v1/credentials` — active, tenant-scoped credentials. Key
/// material is never returned.
#[instrument(skip(state, headers))]
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<CredentialSummary>>, ApiError> {
    let tenant = tenant_id(&headers)?;
    let connection = state.db.get_connection().map_err(ApiError::from)?;
    let credentials = CredentialRepository::new(connection)
        .list_active_for_tenant(&tenant)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(credentials.into_iter().map(CredentialSummary::from).collect()))
}

/// `DELETE /api/v1/credentials/:id` — soft-deletes (deactivates) rather
/// than purging outright, so a credential referenced by an in-flight job's
/// `provider_id` still resolves until that job settles.
#[instrument(skip(state))]
pub async fn deactivate(State(state): State<AppState>, Path(credential_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let connection = state.db.get_connection().map_err(ApiError::from)?;
    CredentialRepository::new(connection).deactivate(credential_id).await.map_err(ApiError::from)?;
    Ok(Json(json!({ "id": credential_id, "active": false })))
}
