// [libs/infra/db/src/repositories/credential.rs]
/*!
 * APARATO: PROVIDER CREDENTIAL REPOSITORY (C1 / C3)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CRUD DE CREDENCIALES DE PROVEEDOR LLM CIFRADAS
 */

use bin2nlp_domain_models::{config::ProviderKind, ProviderCredential};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

const INSERT_CREDENTIAL: &str = r#"
    INSERT INTO provider_credentials (id, tenant_id, display_name, provider_kind, encrypted_key, endpoint_url, config_json, active)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, tenant_id, display_name, provider_kind, encrypted_key, endpoint_url, config_json, active
    FROM provider_credentials WHERE id = ?1
"#;

const SELECT_ACTIVE_FOR_TENANT: &str = r#"
    SELECT id, tenant_id, display_name, provider_kind, encrypted_key, endpoint_url, config_json, active
    FROM provider_credentials WHERE tenant_id = ?1 AND active = 1
"#;

const DEACTIVATE: &str = "UPDATE provider_credentials SET active = 0 WHERE id = ?1";
const DELETE: &str = "DELETE FROM provider_credentials WHERE id = ?1";

pub struct CredentialRepository {
    connection: Connection,
}

impl CredentialRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, credential))]
    pub async fn insert(&self, credential: &ProviderCredential) -> Result<(), DbError> {
        let config_json =
            serde_json::to_string(&credential.config).map_err(|e| DbError::MappingError(e.to_string()))?;

        self.connection
            .execute(
                INSERT_CREDENTIAL,
                params![
                    credential.id.to_string(),
                    credential.tenant_id.clone(),
                    credential.display_name.clone(),
                    provider_kind_as_str(credential.provider_kind),
                    credential.encrypted_key.clone(),
                    credential.endpoint_url.clone(),
                    config_json,
                    credential.active as i64,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<ProviderCredential, DbError> {
        let mut rows = self.connection.query(SELECT_BY_ID, params![id.to_string()]).await?;
        let row = rows.next().await?.ok_or(DbError::CredentialNotFound)?;
        row_to_credential(&row)
    }

    pub async fn list_active_for_tenant(&self, tenant_id: &str) -> Result<Vec<ProviderCredential>, DbError> {
        let mut rows = self.connection.query(SELECT_ACTIVE_FOR_TENANT, params![tenant_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_credential(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<(), DbError> {
        let rows_affected = self.connection.execute(DEACTIVATE, params![id.to_string()]).await?;
        if rows_affected == 0 {
            return Err(DbError::CredentialNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        self.connection.execute(DELETE, params![id.to_string()]).await?;
        Ok(())
    }
}

fn provider_kind_as_str(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Openai => "openai",
        ProviderKind::Anthropic => "anthropic",
        ProviderKind::Gemini => "gemini",
        ProviderKind::Ollama => "ollama",
    }
}

fn parse_provider_kind(value: &str) -> Result<ProviderKind, DbError> {
    match value {
        "openai" => Ok(ProviderKind::Openai),
        "anthropic" => Ok(ProviderKind::Anthropic),
        "gemini" => Ok(ProviderKind::Gemini),
        "ollama" => Ok(ProviderKind::Ollama),
        other => Err(DbError::MappingError(format!("unknown provider kind {other}"))),
    }
}

fn row_to_credential(row: &libsql::Row) -> Result<ProviderCredential, DbError> {
    let id: String = row.get(0)?;
    let tenant_id: String = row.get(1)?;
    let display_name: String = row.get(2)?;
    let provider_kind: String = row.get(3)?;
    let encrypted_key: Vec<u8> = row.get(4)?;
    let endpoint_url: Option<String> = row.get(5)?;
    let config_json: String = row.get(6)?;
    let active: i64 = row.get(7)?;

    Ok(ProviderCredential {
        id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        tenant_id,
        display_name,
        provider_kind: parse_provider_kind(&provider_kind)?,
        encrypted_key,
        endpoint_url,
        config: serde_json::from_str(&config_json).map_err(|e| DbError::MappingError(e.to_string()))?,
        active: active != 0,
    })
}
