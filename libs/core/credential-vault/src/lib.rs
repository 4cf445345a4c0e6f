// [libs/core/credential-vault/src/lib.rs]
/*!
 * APARATO: CREDENTIAL VAULT (C3)
 * CLASIFICACION: CORE SECURITY (ESTRATO L1)
 * RESPONSABILIDAD: CIFRADO SIMETRICO AUTENTICADO DE CREDENCIALES DE PROVEEDOR LLM
 *
 * Clave de proceso de 32 bytes cargada del entorno; en su ausencia se
 * genera una clave efimera con una advertencia registrada. El texto
 * plano nunca sale de los llamadores directos del vault (el ejecutor
 * del pipeline, al vincular un job a un proveedor).
 */

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure modes of the vault. decryption errors always
/// surface as `CredentialUnavailable` and callers must not retry — the
/// ciphertext is corrupt or the process key has rotated.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("credential unavailable: ciphertext is corrupt or the vault key has changed")]
    CredentialUnavailable,
    #[error("malformed sealed payload: {0}")]
    MalformedPayload(String),
}

const KEY_LENGTH_BYTES: usize = 32;
const NONCE_LENGTH_BYTES: usize = 12;

#[derive(Serialize, Deserialize)]
struct SealedPayload {
    nonce_base64: String,
    ciphertext_base64: String,
}

/// Symmetric encryption facade over AES-256-GCM, parameterized by a
/// process-wide key.
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    fn from_key_bytes(key_bytes: &[u8; KEY_LENGTH_BYTES]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Loads the process key from `env_var_name` (expected base64-encoded,
    /// 32 raw bytes). If the variable is absent or malformed, generates an
    /// ephemeral key and logs a warning — credentials encrypted under it
    /// become unrecoverable across a process restart, which is an accepted
    /// trade-off for local/dev deployments.
    pub fn from_env(env_var_name: &str) -> Self {
        match std::env::var(env_var_name) {
            Ok(encoded) => match BASE64.decode(encoded.trim()) {
                Ok(bytes) if bytes.len() == KEY_LENGTH_BYTES => {
                    let mut key_bytes = [0u8; KEY_LENGTH_BYTES];
                    key_bytes.copy_from_slice(&bytes);
                    Self::from_key_bytes(&key_bytes)
                }
                _ => {
                    tracing::warn!(
                        env_var = env_var_name,
                        "🔑 [vault]: configured key is not valid base64-encoded 32 bytes, falling back to an ephemeral key"
                    );
                    Self::ephemeral()
                }
            },
            Err(_) => {
                tracing::warn!(
                    env_var = env_var_name,
                    "🔑 [vault]: no vault key configured, generating an ephemeral process key; credentials will not survive a restart"
                );
                Self::ephemeral()
            }
        }
    }

    fn ephemeral() -> Self {
        let mut key_bytes = [0u8; KEY_LENGTH_BYTES];
        rand::thread_rng().fill_bytes(&mut key_bytes);
        Self::from_key_bytes(&key_bytes)
    }

    /// Encrypts `plaintext`, returning an opaque sealed blob suitable for
    /// storage in a `ProviderCredential` row.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LENGTH_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::CredentialUnavailable)?;

        let sealed = SealedPayload {
            nonce_base64: BASE64.encode(nonce_bytes),
            ciphertext_base64: BASE64.encode(ciphertext),
        };
        serde_json::to_vec(&sealed).map_err(|e| VaultError::MalformedPayload(e.to_string()))
    }

    /// Decrypts a blob produced by `encrypt`. Any failure — malformed
    /// envelope, wrong key, tampered ciphertext — collapses to
    /// `CredentialUnavailable`; this is a terminal, non-retryable failure.
    pub fn decrypt(&self, ciphertext_blob: &[u8]) -> Result<String, VaultError> {
        let sealed: SealedPayload = serde_json::from_slice(ciphertext_blob)
            .map_err(|e| VaultError::MalformedPayload(e.to_string()))?;

        let nonce_bytes = BASE64
            .decode(&sealed.nonce_base64)
            .map_err(|_| VaultError::CredentialUnavailable)?;
        let ciphertext = BASE64
            .decode(&sealed.ciphertext_base64)
            .map_err(|_| VaultError::CredentialUnavailable)?;
        if nonce_bytes.len() != NONCE_LENGTH_BYTES {
            return Err(VaultError::CredentialUnavailable);
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext_bytes = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| VaultError::CredentialUnavailable)?;

        String::from_utf8(plaintext_bytes).map_err(|_| VaultError::CredentialUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let vault = CredentialVault::ephemeral();
        let sealed = vault.encrypt("sk-test-provider-key").unwrap();
        let recovered = vault.decrypt(&sealed).unwrap();
        assert_eq!(recovered, "sk-test-provider-key");
    }

    #[test]
    fn decrypt_rejects_tampered_ciphertext() {
        let vault = CredentialVault::ephemeral();
        let sealed = vault.encrypt("sk-test-provider-key").unwrap();

        // Corrupt a byte inside the ciphertext itself (not the JSON
        // envelope around it) so the AEAD tag check is what fails.
        let mut envelope: SealedPayload = serde_json::from_slice(&sealed).unwrap();
        let mut ciphertext = BASE64.decode(&envelope.ciphertext_base64).unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;
        envelope.ciphertext_base64 = BASE64.encode(ciphertext);
        let tampered = serde_json::to_vec(&envelope).unwrap();

        assert!(matches!(vault.decrypt(&tampered), Err(VaultError::CredentialUnavailable)));
    }

    #[test]
    fn decrypt_rejects_malformed_envelope() {
        let vault = CredentialVault::ephemeral();
        let result = vault.decrypt(b"not json at all");
        assert!(matches!(result, Err(VaultError::MalformedPayload(_))));
    }

    #[test]
    fn two_vaults_with_different_keys_cannot_cross_decrypt() {
        let vault_a = CredentialVault::ephemeral();
        let vault_b = CredentialVault::ephemeral();
        let sealed = vault_a.encrypt("sk-test-provider-key").unwrap();
        assert!(matches!(
            vault_b.decrypt(&sealed),
            Err(VaultError::CredentialUnavailable)
        ));
    }
}
