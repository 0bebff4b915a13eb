use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Utilization and reset time for one recurring quota window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    /// Percent used, as reported (may exceed 100)
    pub utilization: Option<f64>,
    pub resets_at: Option<DateTime<Utc>>,
}

/// Pay-as-you-go balance beyond the plan quota. Amounts are in cents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraUsage {
    pub is_enabled: bool,
    pub monthly_limit: Option<f64>,
    pub used_credits: Option<f64>,
    pub utilization: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    /// Short, session-scoped window (five hours)
    pub five_hour: UsageWindow,
    pub seven_day: UsageWindow,
    pub extra_usage: Option<ExtraUsage>,
}

impl RateLimitSnapshot {
    pub fn is_empty(&self) -> bool {
        self.five_hour.utilization.is_none()
            && self.seven_day.utilization.is_none()
            && self.extra_usage.is_none()
    }
}

/// What the rate-limit cache hands the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimits {
    /// Fetched within the TTL
    Current(RateLimitSnapshot),
    /// Last good snapshot; the latest refresh failed
    Stale(RateLimitSnapshot),
    /// Nothing ever fetched and the refresh failed
    Unknown,
}

impl RateLimits {
    pub fn snapshot(&self) -> Option<&RateLimitSnapshot> {
        match self {
            RateLimits::Current(s) | RateLimits::Stale(s) => Some(s),
            RateLimits::Unknown => None,
        }
    }
}
