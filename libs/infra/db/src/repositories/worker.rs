// [libs/infra/db/src/repositories/worker.rs]
/*!
 * APARATO: WORKER HEARTBEAT REPOSITORY
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: VISIBILIDAD DE WORKERS INDEPENDIENTE DE SUS LEASES
 */

use bin2nlp_domain_models::WorkerHeartbeat;
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

const UPSERT_HEARTBEAT: &str = r#"
    INSERT INTO worker_heartbeats (worker_id, last_seen_at, current_job_id)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(worker_id) DO UPDATE SET
        last_seen_at = excluded.last_seen_at,
        current_job_id = excluded.current_job_id
"#;

const SELECT_ALL: &str = "SELECT worker_id, last_seen_at, current_job_id FROM worker_heartbeats";

pub struct WorkerRepository {
    connection: Connection,
}

impl WorkerRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self))]
    pub async fn record_heartbeat(&self, worker_id: &str, current_job_id: Option<Uuid>) -> Result<(), DbError> {
        self.connection
            .execute(
                UPSERT_HEARTBEAT,
                params![worker_id, Utc::now().to_rfc3339(), current_job_id.map(|id| id.to_string())],
            )
            .await?;
        Ok(())
    }

    pub async fn list_active_workers(&self, at: DateTime<Utc>, timeout_seconds: i64) -> Result<Vec<WorkerHeartbeat>, DbError> {
        let mut rows = self.connection.query(SELECT_ALL, ()).await?;
        let mut all = Vec::new();
        while let Some(row) = rows.next().await? {
            let worker_id: String = row.get(0)?;
            let last_seen_at: String = row.get(1)?;
            let current_job_id: Option<String> = row.get(2)?;

            let heartbeat = WorkerHeartbeat {
                worker_id,
                last_seen_at: parse_rfc3339(&last_seen_at)?,
                current_job_id: current_job_id
                    .map(|id| Uuid::parse_str(&id))
                    .transpose()
                    .map_err(|e| DbError::MappingError(e.to_string()))?,
            };
            if heartbeat.is_alive(at, timeout_seconds) {
                all.push(heartbeat);
            }
        }
        Ok(all)
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}
