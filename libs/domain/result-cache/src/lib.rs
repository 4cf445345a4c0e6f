// [libs/domain/result-cache/src/lib.rs]
/*!
 * APARATO: RESULT CACHE (C5)
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: MEMOIZACION DE TRADUCCIONES COMPLETADAS POR HUELLA
 */

pub mod errors;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bin2nlp_domain_models::{AnalysisDepth, CacheEntry, CacheStats, JobConfig};
use bin2nlp_infra_db::{CacheRepository, DbClient};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

pub use errors::ResultCacheError;

/// Base TTL for a `standard`-depth entry; other depths scale it via
/// `AnalysisDepth::ttl_multiplier`.
pub const DEFAULT_BASE_TTL_HOURS: i64 = 24;

/// Composed keys longer than this are replaced with a hash of themselves.
const MAX_CACHE_KEY_LENGTH: usize = 128;

pub struct ResultCache {
    db: Arc<DbClient>,
    base_ttl: chrono::Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

impl ResultCache {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self::with_base_ttl(db, chrono::Duration::hours(DEFAULT_BASE_TTL_HOURS))
    }

    pub fn with_base_ttl(db: Arc<DbClient>, base_ttl: chrono::Duration) -> Self {
        Self {
            db,
            base_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn repository(&self) -> Result<CacheRepository, ResultCacheError> {
        let connection = self
            .db
            .get_connection()
            .map_err(|e| ResultCacheError::StoreUnavailable(e.to_string()))?;
        Ok(CacheRepository::new(connection))
    }

    /// Derives the composed cache key for a `(file_fingerprint, config)`
    /// pair. Only recognized configuration keys perturb the result, so two
    /// requests that differ solely in unrecognized fields collide.
    pub fn derive_cache_key(file_fingerprint: &str, config: &JobConfig) -> String {
        let mut pairs = config.fingerprint_pairs();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        let joined = pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let fingerprint_config = hex::encode(Sha256::digest(joined.as_bytes()));

        let truncated_file = &file_fingerprint[..file_fingerprint.len().min(16)];
        let composed = format!("result:{truncated_file}:{fingerprint_config}");

        if composed.len() > MAX_CACHE_KEY_LENGTH {
            format!("result:hash:{}", hex::encode(Sha256::digest(composed.as_bytes())))
        } else {
            composed
        }
    }

    /// Looks up a prior translation. A schema-version mismatch or an
    /// expired entry is treated — and swept — as a miss.
    #[instrument(skip(self, config))]
    pub async fn get(&self, file_fingerprint: &str, config: &JobConfig) -> Result<Option<CacheEntry>, ResultCacheError> {
        let cache_key = Self::derive_cache_key(file_fingerprint, config);
        let repo = self.repository()?;

        match repo.lookup(&cache_key).await {
            Ok(Some(entry)) => {
                if entry.is_stale_schema() || entry.is_expired(Utc::now()) {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    if let Err(error) = repo.delete_by_key(&cache_key).await {
                        warn!("⚠️  [result_cache]: failed to evict stale entry: {}", error);
                    }
                    Ok(None)
                } else {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    let _ = repo.touch_access(&cache_key).await;
                    Ok(Some(entry))
                }
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(error) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                Err(ResultCacheError::StoreUnavailable(error.to_string()))
            }
        }
    }

    /// Stores a completed translation under its derived key, tagged with
    /// `depth:<value>`, `provider:<id>` and `extract:<artifact>` for each
    /// artifact kind actually produced, then indexes it by file and tag.
    #[instrument(skip(self, config, result_blob_ref))]
    pub async fn set(
        &self,
        file_fingerprint: &str,
        config: &JobConfig,
        result_blob_ref: String,
        provider_id: Option<&str>,
        produced_artifacts: &[&str],
    ) -> Result<CacheEntry, ResultCacheError> {
        let cache_key = Self::derive_cache_key(file_fingerprint, config);
        let ttl_seconds = (self.base_ttl.num_seconds() as f64 * config.analysis_depth.ttl_multiplier()) as i64;
        let ttl = chrono::Duration::seconds(ttl_seconds);

        let mut tags = vec![format!("depth:{}", config.analysis_depth.tag_value())];
        if let Some(provider_id) = provider_id {
            tags.push(format!("provider:{provider_id}"));
        }
        for artifact in produced_artifacts {
            tags.push(format!("extract:{artifact}"));
        }

        let entry = CacheEntry::new(
            cache_key,
            file_fingerprint.to_string(),
            Self::config_fingerprint(config),
            result_blob_ref,
            tags,
            ttl,
        );

        let repo = self.repository()?;
        match repo.insert(&entry).await {
            Ok(()) => {
                self.sets.fetch_add(1, Ordering::Relaxed);
                Ok(entry)
            }
            Err(error) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                Err(ResultCacheError::StoreUnavailable(error.to_string()))
            }
        }
    }

    fn config_fingerprint(config: &JobConfig) -> String {
        let mut pairs = config.fingerprint_pairs();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        let joined = pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        hex::encode(Sha256::digest(joined.as_bytes()))
    }

    #[instrument(skip(self))]
    pub async fn invalidate_key(&self, cache_key: &str) -> Result<(), ResultCacheError> {
        let repo = self.repository()?;
        repo.delete_by_key(cache_key)
            .await
            .map_err(|e| ResultCacheError::StoreUnavailable(e.to_string()))?;
        self.deletes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn invalidate_by_file(&self, file_fingerprint: &str) -> Result<u64, ResultCacheError> {
        let repo = self.repository()?;
        let count = repo
            .invalidate_by_file(file_fingerprint)
            .await
            .map_err(|e| ResultCacheError::StoreUnavailable(e.to_string()))?;
        self.deletes.fetch_add(count, Ordering::Relaxed);
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn invalidate_by_tag(&self, tag: &str) -> Result<u64, ResultCacheError> {
        let repo = self.repository()?;
        let count = repo
            .invalidate_by_tag(tag)
            .await
            .map_err(|e| ResultCacheError::StoreUnavailable(e.to_string()))?;
        self.deletes.fetch_add(count, Ordering::Relaxed);
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> Result<u64, ResultCacheError> {
        let repo = self.repository()?;
        repo.sweep_expired(Utc::now())
            .await
            .map_err(|e| ResultCacheError::StoreUnavailable(e.to_string()))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bin2nlp_domain_models::TranslationDetail;

    fn sample_config() -> JobConfig {
        JobConfig {
            analysis_depth: AnalysisDepth::Standard,
            translation_detail: TranslationDetail::Basic,
            provider_id: Some("openai-default".to_string()),
            provider_kind: None,
            provider_model: None,
            provider_endpoint: None,
            provider_api_key: None,
        }
    }

    async fn sample_cache() -> ResultCache {
        let db = DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("connect");
        ResultCache::new(Arc::new(db))
    }

    #[test]
    fn derive_cache_key_is_deterministic_regardless_of_field_order() {
        let config = sample_config();
        let key_a = ResultCache::derive_cache_key("abc123def456ghi789", &config);
        let key_b = ResultCache::derive_cache_key("abc123def456ghi789", &config);
        assert_eq!(key_a, key_b);
        assert!(key_a.starts_with("result:abc123def456ghi7"));
    }

    #[tokio::test]
    async fn miss_then_set_then_hit() {
        let cache = sample_cache().await;
        let config = sample_config();

        assert!(cache.get("filefingerprint0001", &config).await.expect("get").is_none());

        cache
            .set("filefingerprint0001", &config, "blob-ref-1".to_string(), Some("openai-default"), &["functions"])
            .await
            .expect("set");

        let hit = cache.get("filefingerprint0001", &config).await.expect("get").expect("hit");
        assert_eq!(hit.result_blob_ref, "blob-ref-1");

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.sets, 1);
    }

    #[tokio::test]
    async fn invalidate_by_file_removes_all_derived_entries() {
        let cache = sample_cache().await;
        let config = sample_config();
        cache
            .set("filefingerprint0002", &config, "blob-ref-2".to_string(), None, &[])
            .await
            .expect("set");

        let removed = cache.invalidate_by_file("filefingerprint0002").await.expect("invalidate");
        assert_eq!(removed, 1);
        assert!(cache.get("filefingerprint0002", &config).await.expect("get").is_none());
    }
}
