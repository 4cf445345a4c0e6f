// [libs/domain/models/src/rate_limit.rs]
//! Rate-limit accounting entities for C4.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sliding-window counter row for one `(identifier, window)` pair.
///
/// Invariant: rows older than 24h are purgeable; the counter sum over the
/// current window equals admitted cost since `window_start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitCounter {
    pub identifier: String,
    pub window: RateWindow,
    pub request_count: u64,
    pub window_start: DateTime<Utc>,
    pub window_size_seconds: u64,
}

/// The four accounting windows. `Burst` shares the minute window's
/// wall-clock span but is tracked against a separate capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RateWindow {
    Minute,
    Hour,
    Day,
    Burst,
}

impl RateWindow {
    pub fn size_seconds(self) -> u64 {
        match self {
            RateWindow::Minute | RateWindow::Burst => 60,
            RateWindow::Hour => 3_600,
            RateWindow::Day => 86_400,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RateWindow::Minute => "minute",
            RateWindow::Hour => "hour",
            RateWindow::Day => "day",
            RateWindow::Burst => "burst",
        }
    }
}

/// Per-tier limits for the three accounting windows plus the burst pool.
/// Configuration-driven (see `RateLimiterConfig`); this type only carries
/// the shape and whatever defaults the deployment sets, never hard-coded
/// into the limiter's admission logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierLimits {
    pub per_minute: u64,
    pub per_hour: u64,
    pub per_day: u64,
    pub burst_capacity: u64,
}

impl TierLimits {
    pub fn limit_for(self, window: RateWindow) -> u64 {
        match window {
            RateWindow::Minute => self.per_minute,
            RateWindow::Hour => self.per_hour,
            RateWindow::Day => self.per_day,
            RateWindow::Burst => self.burst_capacity,
        }
    }

    /// Baseline tier defaults, used only to seed configuration when none is
    /// supplied — never consulted directly by the limiter.
    pub const BASIC: TierLimits = TierLimits {
        per_minute: 10,
        per_hour: 600,
        per_day: 600,
        burst_capacity: 5,
    };
    pub const STANDARD: TierLimits = TierLimits {
        per_minute: 60,
        per_hour: 3_600,
        per_day: 3_600,
        burst_capacity: 20,
    };
    pub const PREMIUM: TierLimits = TierLimits {
        per_minute: 300,
        per_hour: 18_000,
        per_day: 18_000,
        burst_capacity: 50,
    };
    pub const ENTERPRISE: TierLimits = TierLimits {
        per_minute: 1_000,
        per_hour: 60_000,
        per_day: 60_000,
        burst_capacity: 100,
    };
}

/// Reported by `RateLimiter::status()` for one window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowStatus {
    pub limit: u64,
    pub used: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// The outcome of `RateLimiter::check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AdmitDecision {
    Admitted,
    Rejected { retry_after_seconds: u64 },
}
