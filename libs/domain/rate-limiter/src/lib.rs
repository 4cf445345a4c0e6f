// [libs/domain/rate-limiter/src/lib.rs]
/*!
 * APARATO: RATE LIMITER (C4)
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: ADMISION/RECHAZO DE COSTES POR VENTANA DESLIZANTE
 *
 * Tres ventanas (minuto/hora/dia) se evaluan en paralelo contra un pool de
 * rafaga que absorbe picos cortos que de otro modo fallarian la ventana de
 * minuto. Sobre fallo del almacen subyacente el limitador falla abierto
 * (admite) y registra la anomalia: disponibilidad por sobre exactitud
 * estricta es una decision deliberada.
 */

pub mod config;
pub mod errors;

use std::collections::HashMap;
use std::sync::Arc;

use bin2nlp_domain_models::{AdmitDecision, RateWindow, TierLimits, WindowStatus};
use bin2nlp_infra_db::{DbClient, RateLimitRepository};
use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

pub use config::{RateLimiterConfig, LLM_TIER_NAME};
pub use errors::RateLimiterError;

const HARD_WINDOWS: [RateWindow; 2] = [RateWindow::Hour, RateWindow::Day];

pub struct RateLimiter {
    db: Arc<DbClient>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(db: Arc<DbClient>, config: RateLimiterConfig) -> Self {
        Self { db, config }
    }

    fn repository(&self) -> Result<RateLimitRepository, RateLimiterError> {
        let connection = self
            .db
            .get_connection()
            .map_err(|e| RateLimiterError::UnknownTier(format!("connection unavailable: {e}")))?;
        Ok(RateLimitRepository::new(connection))
    }

    /// Admits or rejects a request of integer `cost` for `identifier` under
    /// `tier`. Returns `Admitted` on store failure (fail-open).
    #[instrument(skip(self))]
    pub async fn check(&self, identifier: &str, tier: &str, cost: u64) -> Result<AdmitDecision, RateLimiterError> {
        let limits = self
            .config
            .limits_for(tier)
            .ok_or_else(|| RateLimiterError::UnknownTier(tier.to_string()))?;

        let repo = match self.repository() {
            Ok(repo) => repo,
            Err(error) => {
                warn!("⚠️  [rate_limiter]: store unavailable, failing open: {}", error);
                return Ok(AdmitDecision::Admitted);
            }
        };

        let now = Utc::now();

        for window in HARD_WINDOWS {
            match self.used_in_window(&repo, identifier, window, now).await {
                Ok(used) => {
                    if used + cost > limits.limit_for(window) {
                        let retry_after = self.retry_after(&repo, identifier, window, now).await;
                        return Ok(AdmitDecision::Rejected {
                            retry_after_seconds: retry_after,
                        });
                    }
                }
                Err(error) => {
                    warn!("⚠️  [rate_limiter]: store read failed, failing open: {}", error);
                    return Ok(AdmitDecision::Admitted);
                }
            }
        }

        let minute_used = match self.used_in_window(&repo, identifier, RateWindow::Minute, now).await {
            Ok(used) => used,
            Err(error) => {
                warn!("⚠️  [rate_limiter]: store read failed, failing open: {}", error);
                return Ok(AdmitDecision::Admitted);
            }
        };

        if minute_used + cost <= limits.limit_for(RateWindow::Minute) {
            self.record_admit(&repo, identifier, cost, now, false).await;
            return Ok(AdmitDecision::Admitted);
        }

        let burst_used = match self.used_in_window(&repo, identifier, RateWindow::Burst, now).await {
            Ok(used) => used,
            Err(error) => {
                warn!("⚠️  [rate_limiter]: store read failed, failing open: {}", error);
                return Ok(AdmitDecision::Admitted);
            }
        };

        if burst_used + cost <= limits.limit_for(RateWindow::Burst) {
            self.record_admit(&repo, identifier, cost, now, true).await;
            return Ok(AdmitDecision::Admitted);
        }

        let retry_after = self.retry_after(&repo, identifier, RateWindow::Minute, now).await;
        Ok(AdmitDecision::Rejected {
            retry_after_seconds: retry_after,
        })
    }

    async fn used_in_window(
        &self,
        repo: &RateLimitRepository,
        identifier: &str,
        window: RateWindow,
        now: DateTime<Utc>,
    ) -> Result<u64, bin2nlp_infra_db::DbError> {
        let since = now - chrono::Duration::seconds(window.size_seconds() as i64);
        repo.used_since(identifier, window, since).await
    }

    async fn retry_after(&self, repo: &RateLimitRepository, identifier: &str, window: RateWindow, now: DateTime<Utc>) -> u64 {
        let since = now - chrono::Duration::seconds(window.size_seconds() as i64);
        match repo.oldest_event_since(identifier, window, since).await {
            Ok(Some(oldest)) => {
                let ages_out_at = oldest + chrono::Duration::seconds(window.size_seconds() as i64);
                let remaining = (ages_out_at - now).num_seconds().max(1);
                remaining as u64
            }
            _ => 1,
        }
    }

    async fn record_admit(&self, repo: &RateLimitRepository, identifier: &str, cost: u64, now: DateTime<Utc>, via_burst: bool) {
        for window in [RateWindow::Minute, RateWindow::Hour, RateWindow::Day] {
            if let Err(error) = repo.record(identifier, window, cost, now).await {
                warn!("⚠️  [rate_limiter]: failed to record {:?} counter: {}", window, error);
            }
        }
        if via_burst {
            if let Err(error) = repo.record(identifier, RateWindow::Burst, cost, now).await {
                warn!("⚠️  [rate_limiter]: failed to record burst counter: {}", error);
            }
        }
    }

    /// Reports limit/used/remaining/reset_at for each of the four windows.
    #[instrument(skip(self))]
    pub async fn status(&self, identifier: &str, tier: &str) -> Result<HashMap<RateWindow, WindowStatus>, RateLimiterError> {
        let limits = self
            .config
            .limits_for(tier)
            .ok_or_else(|| RateLimiterError::UnknownTier(tier.to_string()))?;
        let repo = self.repository()?;
        let now = Utc::now();

        let mut out = HashMap::new();
        for window in [RateWindow::Minute, RateWindow::Hour, RateWindow::Day, RateWindow::Burst] {
            let used = self.used_in_window(&repo, identifier, window, now).await.unwrap_or(0);
            let since = now - chrono::Duration::seconds(window.size_seconds() as i64);
            let reset_at = repo
                .oldest_event_since(identifier, window, since)
                .await
                .ok()
                .flatten()
                .map(|oldest| oldest + chrono::Duration::seconds(window.size_seconds() as i64))
                .unwrap_or(now);
            let limit = limits.limit_for(window);
            out.insert(
                window,
                WindowStatus {
                    limit,
                    used,
                    remaining: limit.saturating_sub(used),
                    reset_at,
                },
            );
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn reset(&self, identifier: &str) -> Result<(), RateLimiterError> {
        let repo = self.repository()?;
        repo.reset(identifier)
            .await
            .map_err(|e| RateLimiterError::UnknownTier(format!("reset failed: {e}")))
    }

    #[instrument(skip(self))]
    pub async fn cleanup_expired(&self) -> Result<u64, RateLimiterError> {
        let repo = self.repository()?;
        repo.cleanup_expired()
            .await
            .map_err(|e| RateLimiterError::UnknownTier(format!("cleanup failed: {e}")))
    }

    /// The LLM tier gates outbound-provider cost as two independent
    /// identifier tuples per `(tenant, provider)`: one for request count,
    /// one for estimated tokens.
    pub fn llm_request_identifier(tenant_id: &str, provider: &str) -> String {
        format!("llm:requests:{tenant_id}:{provider}")
    }

    pub fn llm_token_identifier(tenant_id: &str, provider: &str) -> String {
        format!("llm:tokens:{tenant_id}:{provider}")
    }
}

/// Seeds a tier limits map from the baseline defaults, exposed for callers
/// assembling their own `RateLimiterConfig` without pulling in serde config
/// parsing.
pub fn default_tier(name: &str) -> Option<TierLimits> {
    match name {
        "basic" => Some(TierLimits::BASIC),
        "standard" => Some(TierLimits::STANDARD),
        "premium" => Some(TierLimits::PREMIUM),
        "enterprise" => Some(TierLimits::ENTERPRISE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn sample_limiter() -> RateLimiter {
        let db = DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("connect");
        RateLimiter::new(Arc::new(db), RateLimiterConfig::default())
    }

    #[tokio::test]
    async fn admits_requests_within_every_window() {
        let limiter = sample_limiter().await;
        let decision = limiter.check("tenant-a", "basic", 1).await.expect("check");
        assert!(matches!(decision, AdmitDecision::Admitted));
    }

    #[tokio::test]
    async fn rejects_once_the_minute_window_and_burst_pool_are_both_exhausted() {
        let limiter = sample_limiter().await;
        // basic: per_minute=10, burst_capacity=5 -> 15 admits exhaust both paths
        for _ in 0..15 {
            let decision = limiter.check("tenant-b", "basic", 1).await.expect("check");
            assert!(matches!(decision, AdmitDecision::Admitted));
        }
        let decision = limiter.check("tenant-b", "basic", 1).await.expect("check");
        assert!(matches!(decision, AdmitDecision::Rejected { .. }));
    }

    #[tokio::test]
    async fn unknown_tier_is_reported_as_an_error() {
        let limiter = sample_limiter().await;
        let result = limiter.check("tenant-c", "nonexistent", 1).await;
        assert!(matches!(result, Err(RateLimiterError::UnknownTier(_))));
    }

    #[tokio::test]
    async fn reset_clears_accumulated_usage() {
        let limiter = sample_limiter().await;
        for _ in 0..10 {
            limiter.check("tenant-d", "basic", 1).await.expect("check");
        }
        limiter.reset("tenant-d").await.expect("reset");
        let decision = limiter.check("tenant-d", "basic", 1).await.expect("check");
        assert!(matches!(decision, AdmitDecision::Admitted));
    }
}
