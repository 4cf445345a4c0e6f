// [libs/infra/db/src/repositories/session.rs]
/*!
 * APARATO: SESSION REPOSITORY
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ALMACENAMIENTO DE PARES OPACOS CLAVE/VALOR CON TTL
 */

use bin2nlp_domain_models::SessionRecord;
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;

use crate::errors::DbError;

const UPSERT: &str = r#"
    INSERT INTO sessions (session_key, value_json, created_at, expires_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(session_key) DO UPDATE SET
        value_json = excluded.value_json,
        expires_at = excluded.expires_at
"#;

const SELECT: &str = "SELECT session_key, value_json, created_at, expires_at FROM sessions WHERE session_key = ?1";
const DELETE: &str = "DELETE FROM sessions WHERE session_key = ?1";
const DELETE_EXPIRED: &str = "DELETE FROM sessions WHERE expires_at <= ?1";
const TOUCH: &str = "UPDATE sessions SET expires_at = ?2 WHERE session_key = ?1";

pub struct SessionRepository {
    connection: Connection,
}

impl SessionRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, record))]
    pub async fn put(&self, record: &SessionRecord) -> Result<(), DbError> {
        let value_json = serde_json::to_string(&record.value).map_err(|e| DbError::MappingError(e.to_string()))?;
        self.connection
            .execute(
                UPSERT,
                params![
                    record.key.clone(),
                    value_json,
                    record.created_at.to_rfc3339(),
                    record.expires_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str, at: DateTime<Utc>) -> Result<Option<SessionRecord>, DbError> {
        let mut rows = self.connection.query(SELECT, params![key]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let key: String = row.get(0)?;
        let value_json: String = row.get(1)?;
        let created_at: String = row.get(2)?;
        let expires_at: String = row.get(3)?;

        let record = SessionRecord {
            key,
            value: serde_json::from_str(&value_json).map_err(|e| DbError::MappingError(e.to_string()))?,
            created_at: parse_rfc3339(&created_at)?,
            expires_at: parse_rfc3339(&expires_at)?,
        };

        if record.is_expired(at) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        self.connection.execute(DELETE, params![key]).await?;
        Ok(())
    }

    /// Renews a session's TTL in place without rewriting its value.
    /// Rejected if the key is missing (a renewal is only meaningful
    /// against an existing session).
    #[instrument(skip(self))]
    pub async fn touch(&self, key: &str, new_expires_at: DateTime<Utc>) -> Result<(), DbError> {
        let rows_affected = self
            .connection
            .execute(TOUCH, params![key, new_expires_at.to_rfc3339()])
            .await?;
        if rows_affected == 0 {
            return Err(DbError::SessionNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, at: DateTime<Utc>) -> Result<u64, DbError> {
        let rows_affected = self.connection.execute(DELETE_EXPIRED, params![at.to_rfc3339()]).await?;
        Ok(rows_affected)
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}
