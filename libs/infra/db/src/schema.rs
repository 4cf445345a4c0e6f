// [libs/infra/db/src/schema.rs]
/*!
 * APARATO: SCHEMA GOVERNANCE (C1)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: SOLIDIFICACION IDEMPOTENTE DEL ESQUEMA RELACIONAL
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    ("TABLE_JOBS", r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'pending',
            priority TEXT NOT NULL DEFAULT 'normal',
            file_fingerprint TEXT NOT NULL,
            input_blob_ref TEXT NOT NULL,
            result_blob_ref TEXT,
            original_filename TEXT NOT NULL,
            config_json TEXT NOT NULL,
            progress_percentage INTEGER NOT NULL DEFAULT 0,
            current_stage TEXT,
            worker_id TEXT,
            next_eligible_at TEXT NOT NULL DEFAULT (datetime('now')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            started_at TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            completed_at TEXT,
            tenant_id TEXT NOT NULL,
            callback_url TEXT,
            correlation_id TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            processing_time_accumulated_ms INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            metadata_json TEXT NOT NULL DEFAULT '{}'
        );
    "#),
    ("TABLE_DEAD_LETTERS", r#"
        CREATE TABLE IF NOT EXISTS dead_letters (
            job_id TEXT PRIMARY KEY,
            reason TEXT NOT NULL,
            failed_at TEXT NOT NULL DEFAULT (datetime('now')),
            job_snapshot_json TEXT NOT NULL
        );
    "#),
    ("TABLE_CACHE_INDEX", r#"
        CREATE TABLE IF NOT EXISTS cache_index (
            cache_key TEXT PRIMARY KEY,
            file_fingerprint TEXT NOT NULL,
            config_fingerprint TEXT NOT NULL,
            result_blob_ref TEXT NOT NULL,
            schema_version INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            expires_at TEXT NOT NULL,
            access_count INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_CACHE_TAGS", r#"
        CREATE TABLE IF NOT EXISTS cache_tags (
            cache_key TEXT NOT NULL,
            tag TEXT NOT NULL,
            PRIMARY KEY (cache_key, tag)
        );
    "#),
    ("TABLE_RATE_LIMIT_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS rate_limit_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identifier TEXT NOT NULL,
            window_label TEXT NOT NULL,
            cost INTEGER NOT NULL,
            recorded_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
    "#),
    ("TABLE_WORKER_LEASES", r#"
        CREATE TABLE IF NOT EXISTS worker_leases (
            job_id TEXT PRIMARY KEY,
            worker_id TEXT NOT NULL,
            started_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
    "#),
    ("TABLE_WORKER_HEARTBEATS", r#"
        CREATE TABLE IF NOT EXISTS worker_heartbeats (
            worker_id TEXT PRIMARY KEY,
            last_seen_at TEXT NOT NULL DEFAULT (datetime('now')),
            current_job_id TEXT
        );
    "#),
    ("TABLE_PROVIDER_CREDENTIALS", r#"
        CREATE TABLE IF NOT EXISTS provider_credentials (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            display_name TEXT NOT NULL,
            provider_kind TEXT NOT NULL,
            encrypted_key BLOB NOT NULL,
            endpoint_url TEXT,
            config_json TEXT NOT NULL DEFAULT '{}',
            active INTEGER NOT NULL DEFAULT 1
        );
    "#),
    ("TABLE_SESSIONS", r#"
        CREATE TABLE IF NOT EXISTS sessions (
            session_key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            expires_at TEXT NOT NULL
        );
    "#),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_JOBS_DISPATCH", "CREATE INDEX IF NOT EXISTS idx_jobs_dispatch ON jobs(status, priority, next_eligible_at, created_at);"),
    ("IDX_JOBS_TENANT", "CREATE INDEX IF NOT EXISTS idx_jobs_tenant ON jobs(tenant_id);"),
    ("IDX_JOBS_WORKER", "CREATE INDEX IF NOT EXISTS idx_jobs_worker ON jobs(worker_id);"),
    ("IDX_CACHE_FILE", "CREATE INDEX IF NOT EXISTS idx_cache_file ON cache_index(file_fingerprint);"),
    ("IDX_CACHE_EXPIRY", "CREATE INDEX IF NOT EXISTS idx_cache_expiry ON cache_index(expires_at);"),
    ("IDX_CACHE_TAGS_TAG", "CREATE INDEX IF NOT EXISTS idx_cache_tags_tag ON cache_tags(tag);"),
    ("IDX_RATE_EVENTS_LOOKUP", "CREATE INDEX IF NOT EXISTS idx_rate_events_lookup ON rate_limit_events(identifier, window_label, recorded_at);"),
    ("IDX_WORKER_LEASES_STARTED", "CREATE INDEX IF NOT EXISTS idx_worker_leases_started ON worker_leases(started_at);"),
    ("IDX_CREDENTIALS_TENANT", "CREATE INDEX IF NOT EXISTS idx_credentials_tenant ON provider_credentials(tenant_id, active);"),
    ("IDX_SESSIONS_EXPIRY", "CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);"),
];

/// Applies the full schema, tolerating a schema that has already been
/// solidified by a prior boot (`CREATE TABLE IF NOT EXISTS` / `CREATE INDEX
/// IF NOT EXISTS` throughout).
#[instrument(skip(database_connection))]
pub async fn apply_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [schema]: synchronizing relational schema");

    for (identifier, sql) in BASE_TABLES {
        debug!("  ↳ solidifying: {}", identifier);
        database_connection
            .execute(sql, ())
            .await
            .with_context(|| format!("failed to solidify table {identifier}"))?;
    }

    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ hardening: {}", identifier);
        match database_connection.execute(sql, ()).await {
            Ok(_) => {}
            Err(e) => warn!("  ⚠️ index {} not applied cleanly: {}", identifier, e),
        }
    }

    info!("✅ [schema]: relational schema certified");
    Ok(())
}
