// [apps/orchestrator/src/config.rs]
/*!
 * APARATO: CONFIGURACION DEL PROCESO
 * CLASIFICACION: COMPOSITION ROOT (ESTRATO L0)
 * RESPONSABILIDAD: LECTURA Y VALIDACION DE LOS CONTROLES DE OPERADOR
 */

use std::collections::HashMap;
use std::time::Duration;

use bin2nlp_domain_models::TierLimits;
use bin2nlp_domain_rate_limiter::{RateLimiterConfig, LLM_TIER_NAME};

/// Typed view over the environment variables an operator is expected to
/// set. Every field here corresponds to a deployable knob; nothing in the
/// rest of the crate reads `std::env` directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_token: Option<String>,
    pub blob_store_path: String,
    pub max_upload_size_bytes: u64,
    pub default_operation_timeout: Duration,
    pub max_operation_timeout: Duration,
    pub stale_lease_timeout: Duration,
    pub worker_concurrency: usize,
    pub decompiler_executable_path: String,
    pub vault_key_env_var: String,
    pub cleanup_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub bind_address: String,
    pub tier_limits: HashMap<String, TierLimits>,
}

impl Config {
    /// Reads every recognized variable, falling back to the defaults a
    /// local/dev deployment would want. `dotenvy::dotenv().ok()` is expected
    /// to have already been called by the caller so a `.env` file, if
    /// present, has already populated the process environment.
    pub fn from_env() -> Self {
        Self {
            database_url: env_string("DATABASE_URL", "file:bin2nlp.db"),
            database_token: std::env::var("DATABASE_AUTH_TOKEN").ok(),
            blob_store_path: env_string("BLOB_STORE_PATH", "./data/blobs"),
            max_upload_size_bytes: env_u64("MAX_UPLOAD_SIZE_BYTES", 100 * 1024 * 1024),
            default_operation_timeout: Duration::from_secs(env_u64("DEFAULT_OPERATION_TIMEOUT_SECONDS", 300)),
            max_operation_timeout: Duration::from_secs(env_u64("MAX_OPERATION_TIMEOUT_SECONDS", 1200)),
            stale_lease_timeout: Duration::from_secs(env_u64("STALE_LEASE_TIMEOUT_SECONDS", 3600)),
            worker_concurrency: env_usize("WORKER_CONCURRENCY", default_worker_concurrency()),
            decompiler_executable_path: env_string("DECOMPILER_EXECUTABLE_PATH", "/usr/local/bin/bin2nlp-decompiler"),
            vault_key_env_var: env_string("VAULT_KEY_ENV_VAR", "BIN2NLP_VAULT_KEY"),
            cleanup_interval: Duration::from_secs(env_u64("CLEANUP_INTERVAL_SECONDS", 300)),
            heartbeat_timeout: Duration::from_secs(env_u64("WORKER_HEARTBEAT_TIMEOUT_SECONDS", 90)),
            bind_address: env_string("BIND_ADDRESS", "0.0.0.0:8080"),
            tier_limits: tier_limits_from_env(),
        }
    }

    /// Startup sanity pass. Anything caught here is a deployment mistake,
    /// not a runtime condition, so it is fatal rather than logged and
    /// skipped.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("DATABASE_URL must not be empty".to_string());
        }
        if self.max_upload_size_bytes == 0 {
            return Err("MAX_UPLOAD_SIZE_BYTES must be greater than zero".to_string());
        }
        if self.worker_concurrency == 0 {
            return Err("WORKER_CONCURRENCY must be at least 1".to_string());
        }
        if self.max_operation_timeout < self.default_operation_timeout {
            return Err("MAX_OPERATION_TIMEOUT_SECONDS must be >= DEFAULT_OPERATION_TIMEOUT_SECONDS".to_string());
        }
        if self.blob_store_path.is_empty() {
            return Err("BLOB_STORE_PATH must not be empty".to_string());
        }
        reject_reserved_tier_override(&self.tier_limits)?;
        Ok(())
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        let mut config = RateLimiterConfig::default();
        for (tier, limits) in &self.tier_limits {
            config.insert(tier.clone(), *limits);
        }
        config
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn default_worker_concurrency() -> usize {
    num_cpus::get().max(1)
}

/// Per-tier overrides supplied as `RATE_LIMIT_TIER_<NAME>=<minute>,<hour>,<day>,<burst>`.
/// Tiers not overridden keep the baseline defaults seeded by
/// `RateLimiterConfig::default()`.
fn tier_limits_from_env() -> HashMap<String, TierLimits> {
    let mut overrides = HashMap::new();
    for (key, value) in std::env::vars() {
        let Some(tier_name) = key.strip_prefix("RATE_LIMIT_TIER_") else {
            continue;
        };
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() != 4 {
            tracing::warn!(tier = tier_name, "⚠️ [config]: malformed tier override, expected 4 comma-separated values");
            continue;
        }
        let parsed: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
        if let Some(values) = parsed {
            overrides.insert(
                tier_name.to_lowercase(),
                TierLimits {
                    per_minute: values[0],
                    per_hour: values[1],
                    per_day: values[2],
                    burst_capacity: values[3],
                },
            );
        }
    }
    overrides
}

/// Guards against an override of the reserved LLM gating tier via the
/// generic tenant-tier env convention; that tier is sized independently.
pub fn reject_reserved_tier_override(tier_limits: &HashMap<String, TierLimits>) -> Result<(), String> {
    if tier_limits.contains_key(LLM_TIER_NAME) {
        return Err(format!("tier name '{LLM_TIER_NAME}' is reserved for outbound LLM gating and cannot be overridden as a tenant tier"));
    }
    Ok(())
}
