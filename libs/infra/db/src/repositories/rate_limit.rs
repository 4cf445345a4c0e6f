// [libs/infra/db/src/repositories/rate_limit.rs]
/*!
 * APARATO: RATE LIMIT COUNTER REPOSITORY (C1 / C4)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CONTABILIDAD DE EVENTOS ADMITIDOS POR VENTANA DESLIZANTE
 */

use bin2nlp_domain_models::RateWindow;
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;

use crate::errors::DbError;

const INSERT_EVENT: &str = r#"
    INSERT INTO rate_limit_events (identifier, window_label, cost, recorded_at)
    VALUES (?1, ?2, ?3, ?4)
"#;

const SUM_SINCE: &str = r#"
    SELECT COALESCE(SUM(cost), 0) FROM rate_limit_events
    WHERE identifier = ?1 AND window_label = ?2 AND recorded_at >= ?3
"#;

const OLDEST_SINCE: &str = r#"
    SELECT MIN(recorded_at) FROM rate_limit_events
    WHERE identifier = ?1 AND window_label = ?2 AND recorded_at >= ?3
"#;

const DELETE_OLDER_THAN: &str = "DELETE FROM rate_limit_events WHERE recorded_at < ?1";
const DELETE_FOR_IDENTIFIER: &str = "DELETE FROM rate_limit_events WHERE identifier = ?1";

pub struct RateLimitRepository {
    connection: Connection,
}

impl RateLimitRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self))]
    pub async fn record(&self, identifier: &str, window: RateWindow, cost: u64, at: DateTime<Utc>) -> Result<(), DbError> {
        self.connection
            .execute(INSERT_EVENT, params![identifier, window.as_str(), cost as i64, at.to_rfc3339()])
            .await?;
        Ok(())
    }

    pub async fn used_since(&self, identifier: &str, window: RateWindow, since: DateTime<Utc>) -> Result<u64, DbError> {
        let mut rows = self
            .connection
            .query(SUM_SINCE, params![identifier, window.as_str(), since.to_rfc3339()])
            .await?;
        let row = rows.next().await?.ok_or(DbError::MappingError("expected scalar row".into()))?;
        let used: i64 = row.get(0)?;
        Ok(used as u64)
    }

    pub async fn oldest_event_since(
        &self,
        identifier: &str,
        window: RateWindow,
        since: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        let mut rows = self
            .connection
            .query(OLDEST_SINCE, params![identifier, window.as_str(), since.to_rfc3339()])
            .await?;
        let row = rows.next().await?.ok_or(DbError::MappingError("expected scalar row".into()))?;
        let raw: Option<String> = row.get(0)?;
        raw.map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::MappingError(e.to_string()))
        })
        .transpose()
    }

    #[instrument(skip(self))]
    pub async fn reset(&self, identifier: &str) -> Result<(), DbError> {
        self.connection.execute(DELETE_FOR_IDENTIFIER, params![identifier]).await?;
        Ok(())
    }

    /// Purges rows older than 24h, matching the counter invariant that
    /// rows outside the window are purgeable.
    #[instrument(skip(self))]
    pub async fn cleanup_expired(&self) -> Result<u64, DbError> {
        let cutoff = Utc::now() - chrono::Duration::hours(24);
        let rows_affected = self.connection.execute(DELETE_OLDER_THAN, params![cutoff.to_rfc3339()]).await?;
        Ok(rows_affected)
    }
}
