// [libs/infra/blob-store/src/lib.rs]
/*!
 * APARATO: BLOB STORE (C2)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE PAYLOADS BINARIOS Y DOCUMENTOS DE
 * RESULTADO DIRECCIONADOS POR CONTENIDO, SOBRE EL SISTEMA DE ARCHIVOS LOCAL.
 */

pub mod errors;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bin2nlp_domain_models::BlobMetadata;
use chrono::Utc;
use fs2::FileExt;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

pub use errors::BlobError;

/// Clave maxima aceptada antes de tocar el sistema de archivos.
pub const DEFAULT_MAX_KEY_LENGTH_BYTES: usize = 512;

/// Almacen de objetos direccionado por contenido: cada clave opaca se
/// hashea a SHA-256 y se distribuye en un arbol de dos niveles de
/// particiones (`hash[0:2]/hash[2:4]`) para evitar directorios masivos.
///
/// Cada objeto ocupa tres archivos hermanos bajo su particion:
/// `<hash>.json` (payload), `<hash>.meta` (sidecar con TTL) y
/// `<hash>.lock` (cerrojo advisory que solo los escritores toman).
pub struct BlobStore {
    base_path: PathBuf,
    max_key_length_bytes: usize,
}

struct ShardPaths {
    shard_dir: PathBuf,
    payload: PathBuf,
    meta: PathBuf,
    lock: PathBuf,
}

impl BlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_max_key_length(base_path, DEFAULT_MAX_KEY_LENGTH_BYTES)
    }

    pub fn with_max_key_length(base_path: impl Into<PathBuf>, max_key_length_bytes: usize) -> Self {
        Self {
            base_path: base_path.into(),
            max_key_length_bytes,
        }
    }

    fn shard_paths(&self, key: &str) -> ShardPaths {
        let digest = Sha256::digest(key.as_bytes());
        let hash_hex = hex::encode(digest);
        let shard_dir = self
            .base_path
            .join(&hash_hex[0..2])
            .join(&hash_hex[2..4]);
        ShardPaths {
            payload: shard_dir.join(format!("{hash_hex}.json")),
            meta: shard_dir.join(format!("{hash_hex}.meta")),
            lock: shard_dir.join(format!("{hash_hex}.lock")),
            shard_dir,
        }
    }

    fn validate_key(&self, key: &str) -> Result<(), BlobError> {
        if key.len() > self.max_key_length_bytes {
            return Err(BlobError::KeyTooLarge(key.len(), self.max_key_length_bytes));
        }
        Ok(())
    }

    /// Escribe un payload y su sidecar de TTL de forma atomica. Los
    /// escritores toman el cerrojo advisory del objeto; los lectores no.
    #[instrument(skip(self, bytes))]
    pub async fn put(&self, key: &str, bytes: Vec<u8>, ttl: chrono::Duration) -> Result<(), BlobError> {
        self.validate_key(key)?;
        let paths = self.shard_paths(key);
        let metadata = BlobMetadata::new(key.to_string(), ttl);
        let meta_bytes = serde_json::to_vec(&metadata)?;

        tokio::fs::create_dir_all(&paths.shard_dir).await?;

        tokio::task::spawn_blocking(move || write_locked(&paths, &bytes, &meta_bytes))
            .await
            .map_err(|e| BlobError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        debug!("🔒 [blob_store]: sealed object under key of {} bytes", key.len());
        Ok(())
    }

    /// Recupera el payload si existe y no ha expirado. No adquiere cerrojo.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        self.validate_key(key)?;
        let paths = self.shard_paths(key);

        let meta_bytes = match tokio::fs::read(&paths.meta).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BlobError::Io(e)),
        };
        let metadata: BlobMetadata = serde_json::from_slice(&meta_bytes)?;
        if metadata.is_expired(Utc::now()) {
            return Ok(None);
        }

        match tokio::fs::read(&paths.payload).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    /// Elimina un objeto incondicionalmente (idempotente si ya no existe).
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.validate_key(key)?;
        let paths = self.shard_paths(key);

        tokio::task::spawn_blocking(move || delete_locked(&paths))
            .await
            .map_err(|e| BlobError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Lista las claves originales (no expiradas) cuyo prefijo coincide.
    /// Recorre el arbol completo de particiones — no hay un indice
    /// secundario por prefijo, asi que el costo es lineal en el numero de
    /// objetos almacenados.
    #[instrument(skip(self))]
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        let base_path = self.base_path.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || list_locked(&base_path, &prefix))
            .await
            .map_err(|e| BlobError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Recorre el arbol de particiones reclamando objetos expirados.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> Result<u64, BlobError> {
        let base_path = self.base_path.clone();
        tokio::task::spawn_blocking(move || sweep_locked(&base_path))
            .await
            .map_err(|e| BlobError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Arranca una tarea de fondo que barre objetos expirados a intervalo fijo.
    pub fn spawn_sweep_task(self: Arc<Self>, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.sweep_expired().await {
                    Ok(reclaimed) if reclaimed > 0 => {
                        debug!("♻️  [blob_store]: swept {} expired objects", reclaimed);
                    }
                    Ok(_) => {}
                    Err(error) => {
                        warn!("⚠️  [blob_store]: sweep pass failed: {:?}", error);
                    }
                }
            }
        })
    }
}

fn write_locked(paths: &ShardPaths, bytes: &[u8], meta_bytes: &[u8]) -> Result<(), BlobError> {
    use std::fs::OpenOptions;
    use std::io::Write;

    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&paths.lock)?;
    lock_file.lock_exclusive().map_err(|_| BlobError::LockUnavailable)?;

    let tmp_payload = paths.payload.with_extension("json.tmp");
    {
        let mut f = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_payload)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp_payload, &paths.payload)?;

    let tmp_meta = paths.meta.with_extension("meta.tmp");
    {
        let mut f = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_meta)?;
        f.write_all(meta_bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp_meta, &paths.meta)?;

    FileExt::unlock(&lock_file)?;
    Ok(())
}

fn delete_locked(paths: &ShardPaths) -> Result<(), BlobError> {
    use std::fs::OpenOptions;

    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&paths.lock)?;
    lock_file.lock_exclusive().map_err(|_| BlobError::LockUnavailable)?;

    match std::fs::remove_file(&paths.payload) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BlobError::Io(e)),
    }
    match std::fs::remove_file(&paths.meta) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BlobError::Io(e)),
    }

    FileExt::unlock(&lock_file)?;
    Ok(())
}

fn list_locked(base_path: &Path, prefix: &str) -> Result<Vec<String>, BlobError> {
    if !base_path.exists() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    let now = Utc::now();

    for level1 in std::fs::read_dir(base_path)? {
        let level1 = level1?;
        if !level1.file_type()?.is_dir() {
            continue;
        }
        for level2 in std::fs::read_dir(level1.path())? {
            let level2 = level2?;
            if !level2.file_type()?.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(level2.path())? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("meta") {
                    continue;
                }

                let meta_bytes = match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(_) => continue,
                };
                let metadata: BlobMetadata = match serde_json::from_slice(&meta_bytes) {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                if metadata.is_expired(now) {
                    continue;
                }
                if metadata.original_key.starts_with(prefix) {
                    matches.push(metadata.original_key);
                }
            }
        }
    }

    Ok(matches)
}

fn sweep_locked(base_path: &Path) -> Result<u64, BlobError> {
    if !base_path.exists() {
        return Ok(0);
    }

    let mut reclaimed = 0u64;
    let now = Utc::now();

    for level1 in std::fs::read_dir(base_path)? {
        let level1 = level1?;
        if !level1.file_type()?.is_dir() {
            continue;
        }
        for level2 in std::fs::read_dir(level1.path())? {
            let level2 = level2?;
            if !level2.file_type()?.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(level2.path())? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("meta") {
                    continue;
                }

                let meta_bytes = match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(_) => continue,
                };
                let metadata: BlobMetadata = match serde_json::from_slice(&meta_bytes) {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                if !metadata.is_expired(now) {
                    continue;
                }

                let payload_path = path.with_extension("json");
                let lock_path = path.with_extension("lock");
                let _ = std::fs::remove_file(&payload_path);
                let _ = std::fs::remove_file(&path);
                let _ = std::fs::remove_file(&lock_path);
                reclaimed += 1;
            }
        }
    }

    Ok(reclaimed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> (BlobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        (BlobStore::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn put_then_get_round_trips_payload() {
        let (store, _dir) = sample_store();
        store
            .put("decompilation:abc123", b"hello world".to_vec(), chrono::Duration::seconds(60))
            .await
            .expect("put");

        let fetched = store.get("decompilation:abc123").await.expect("get");
        assert_eq!(fetched, Some(b"hello world".to_vec()));
    }

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let (store, _dir) = sample_store();
        let fetched = store.get("never-written").await.expect("get");
        assert_eq!(fetched, None);
    }

    #[tokio::test]
    async fn expired_object_is_hidden_from_get() {
        let (store, _dir) = sample_store();
        store
            .put("soon-expired", b"payload".to_vec(), chrono::Duration::seconds(-1))
            .await
            .expect("put");

        let fetched = store.get("soon-expired").await.expect("get");
        assert_eq!(fetched, None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _dir) = sample_store();
        store
            .put("to-delete", b"payload".to_vec(), chrono::Duration::seconds(60))
            .await
            .expect("put");

        store.delete("to-delete").await.expect("first delete");
        store.delete("to-delete").await.expect("second delete should not error");

        assert_eq!(store.get("to-delete").await.expect("get"), None);
    }

    #[tokio::test]
    async fn oversized_key_is_rejected_before_touching_disk() {
        let (store, _dir) = sample_store();
        let oversized_key = "x".repeat(DEFAULT_MAX_KEY_LENGTH_BYTES + 1);

        let result = store.put(&oversized_key, b"payload".to_vec(), chrono::Duration::seconds(60)).await;
        assert!(matches!(result, Err(BlobError::KeyTooLarge(_, _))));
    }

    #[tokio::test]
    async fn list_returns_only_live_keys_matching_the_prefix() {
        let (store, _dir) = sample_store();
        store.put("result:abc", b"one".to_vec(), chrono::Duration::seconds(300)).await.expect("put");
        store.put("result:def", b"two".to_vec(), chrono::Duration::seconds(300)).await.expect("put");
        store.put("input:xyz", b"three".to_vec(), chrono::Duration::seconds(300)).await.expect("put");
        store.put("result:expired", b"four".to_vec(), chrono::Duration::seconds(-1)).await.expect("put");

        let mut matches = store.list("result:").await.expect("list");
        matches.sort();
        assert_eq!(matches, vec!["result:abc".to_string(), "result:def".to_string()]);
    }

    #[tokio::test]
    async fn sweep_expired_reclaims_stale_objects_only() {
        let (store, _dir) = sample_store();
        store
            .put("fresh", b"keep".to_vec(), chrono::Duration::seconds(300))
            .await
            .expect("put fresh");
        store
            .put("stale", b"gone".to_vec(), chrono::Duration::seconds(-1))
            .await
            .expect("put stale");

        let reclaimed = store.sweep_expired().await.expect("sweep");
        assert_eq!(reclaimed, 1);
        assert_eq!(store.get("fresh").await.expect("get fresh"), Some(b"keep".to_vec()));
    }
}
