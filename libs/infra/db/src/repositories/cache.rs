// [libs/infra/db/src/repositories/cache.rs]
/*!
 * APARATO: CACHE INDEX REPOSITORY (C1 / C5)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL INDICE DE RESULTADOS Y SUS ETIQUETAS
 */

use bin2nlp_domain_models::CacheEntry;
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;

use crate::errors::DbError;

const INSERT_CACHE_ENTRY: &str = r#"
    INSERT OR REPLACE INTO cache_index (
        cache_key, file_fingerprint, config_fingerprint, result_blob_ref,
        schema_version, created_at, expires_at, access_count
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)
"#;

const INSERT_TAG: &str = "INSERT OR IGNORE INTO cache_tags (cache_key, tag) VALUES (?1, ?2)";

const SELECT_ENTRY: &str = r#"
    SELECT cache_key, file_fingerprint, config_fingerprint, result_blob_ref,
           schema_version, created_at, expires_at, access_count
    FROM cache_index WHERE cache_key = ?1
"#;

const SELECT_TAGS_FOR_KEY: &str = "SELECT tag FROM cache_tags WHERE cache_key = ?1";

const TOUCH_ACCESS: &str = "UPDATE cache_index SET access_count = access_count + 1 WHERE cache_key = ?1";

const DELETE_ENTRY: &str = "DELETE FROM cache_index WHERE cache_key = ?1";
const DELETE_TAGS_FOR_KEY: &str = "DELETE FROM cache_tags WHERE cache_key = ?1";

const SELECT_KEYS_BY_FILE: &str = "SELECT cache_key FROM cache_index WHERE file_fingerprint = ?1";
const SELECT_KEYS_BY_TAG: &str = "SELECT cache_key FROM cache_tags WHERE tag = ?1";
const SELECT_EXPIRED_KEYS: &str = "SELECT cache_key FROM cache_index WHERE expires_at <= ?1";

pub struct CacheRepository {
    connection: Connection,
}

impl CacheRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, entry))]
    pub async fn insert(&self, entry: &CacheEntry) -> Result<(), DbError> {
        self.connection
            .execute(
                INSERT_CACHE_ENTRY,
                params![
                    entry.cache_key.clone(),
                    entry.file_fingerprint.clone(),
                    entry.config_fingerprint.clone(),
                    entry.result_blob_ref.clone(),
                    entry.schema_version as i64,
                    entry.created_at.to_rfc3339(),
                    entry.expires_at.to_rfc3339(),
                ],
            )
            .await?;

        for tag in &entry.tags {
            self.connection.execute(INSERT_TAG, params![entry.cache_key.clone(), tag.clone()]).await?;
        }
        Ok(())
    }

    pub async fn lookup(&self, cache_key: &str) -> Result<Option<CacheEntry>, DbError> {
        let mut rows = self.connection.query(SELECT_ENTRY, params![cache_key]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let cache_key: String = row.get(0)?;
        let file_fingerprint: String = row.get(1)?;
        let config_fingerprint: String = row.get(2)?;
        let result_blob_ref: String = row.get(3)?;
        let schema_version: i64 = row.get(4)?;
        let created_at: String = row.get(5)?;
        let expires_at: String = row.get(6)?;
        let access_count: i64 = row.get(7)?;

        let mut tag_rows = self.connection.query(SELECT_TAGS_FOR_KEY, params![cache_key.clone()]).await?;
        let mut tags = Vec::new();
        while let Some(tag_row) = tag_rows.next().await? {
            tags.push(tag_row.get::<String>(0)?);
        }

        Ok(Some(CacheEntry {
            cache_key,
            file_fingerprint,
            config_fingerprint,
            result_blob_ref,
            schema_version: schema_version as u32,
            tags,
            created_at: parse_rfc3339(&created_at)?,
            expires_at: parse_rfc3339(&expires_at)?,
            access_count: access_count as u64,
        }))
    }

    pub async fn touch_access(&self, cache_key: &str) -> Result<(), DbError> {
        // Best-effort: failures here must not fail the caller's read path.
        let _ = self.connection.execute(TOUCH_ACCESS, params![cache_key]).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_by_key(&self, cache_key: &str) -> Result<(), DbError> {
        self.connection.execute(DELETE_TAGS_FOR_KEY, params![cache_key]).await?;
        self.connection.execute(DELETE_ENTRY, params![cache_key]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn invalidate_by_file(&self, file_fingerprint: &str) -> Result<u64, DbError> {
        let keys = self.collect_keys(SELECT_KEYS_BY_FILE, file_fingerprint).await?;
        for key in &keys {
            self.delete_by_key(key).await?;
        }
        Ok(keys.len() as u64)
    }

    #[instrument(skip(self))]
    pub async fn invalidate_by_tag(&self, tag: &str) -> Result<u64, DbError> {
        let keys = self.collect_keys(SELECT_KEYS_BY_TAG, tag).await?;
        for key in &keys {
            self.delete_by_key(key).await?;
        }
        Ok(keys.len() as u64)
    }

    pub async fn sweep_expired(&self, at: DateTime<Utc>) -> Result<u64, DbError> {
        let keys = self.collect_keys(SELECT_EXPIRED_KEYS, &at.to_rfc3339()).await?;
        for key in &keys {
            self.delete_by_key(key).await?;
        }
        Ok(keys.len() as u64)
    }

    async fn collect_keys(&self, sql: &str, param: &str) -> Result<Vec<String>, DbError> {
        let mut rows = self.connection.query(sql, params![param]).await?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next().await? {
            keys.push(row.get::<String>(0)?);
        }
        Ok(keys)
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}
