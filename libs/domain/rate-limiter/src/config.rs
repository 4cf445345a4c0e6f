// [libs/domain/rate-limiter/src/config.rs]
//! Tier table for C4. Configuration-driven per the rate limiter's contract:
//! tier names and their per-window limits are data, never hard-coded into
//! the admission algorithm itself.

use std::collections::HashMap;

use bin2nlp_domain_models::TierLimits;

/// The reserved tier name gating outbound LLM provider calls. Its limits
/// are configured independently of the client-facing tenant tiers.
pub const LLM_TIER_NAME: &str = "llm";

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    tiers: HashMap<String, TierLimits>,
}

impl RateLimiterConfig {
    pub fn new(tiers: HashMap<String, TierLimits>) -> Self {
        Self { tiers }
    }

    pub fn limits_for(&self, tier: &str) -> Option<TierLimits> {
        self.tiers.get(tier).copied()
    }

    pub fn insert(&mut self, tier: impl Into<String>, limits: TierLimits) {
        self.tiers.insert(tier.into(), limits);
    }
}

impl Default for RateLimiterConfig {
    /// Seeds the literal tier defaults; operators override via their own
    /// configuration layer rather than by editing this module.
    fn default() -> Self {
        let mut tiers = HashMap::new();
        tiers.insert("basic".to_string(), TierLimits::BASIC);
        tiers.insert("standard".to_string(), TierLimits::STANDARD);
        tiers.insert("premium".to_string(), TierLimits::PREMIUM);
        tiers.insert("enterprise".to_string(), TierLimits::ENTERPRISE);
        tiers.insert(
            LLM_TIER_NAME.to_string(),
            TierLimits {
                per_minute: 120,
                per_hour: 7_200,
                per_day: 7_200,
                burst_capacity: 30,
            },
        );
        Self { tiers }
    }
}
