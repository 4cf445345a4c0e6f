// [libs/domain/models/src/credential.rs]
//! Tenant-scoped provider credential entity for C1/C3.

use serde::{Deserialize, Serialize};

use crate::config::ProviderKind;

/// A tenant's stored LLM provider credential. The key material is never
/// held in this type in plaintext — `encrypted_key` is the vault's
/// ciphertext blob, decrypted only transiently by the pipeline executor
/// when binding a job to a provider.
///
/// Invariant: decryption yields a non-empty key; `endpoint_url` is present
/// iff `provider_kind.requires_endpoint()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredential {
    pub id: uuid::Uuid,
    pub tenant_id: String,
    pub display_name: String,
    pub provider_kind: ProviderKind,
    pub encrypted_key: Vec<u8>,
    pub endpoint_url: Option<String>,
    pub config: serde_json::Value,
    pub active: bool,
}

impl ProviderCredential {
    pub fn endpoint_requirement_satisfied(&self) -> bool {
        self.provider_kind.requires_endpoint() == self.endpoint_url.is_some()
    }
}
