//! Online usage limits retrieved from the Claude OAuth usage endpoint.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::debug;

use crate::credentials::Credential;
use crate::error::{StatusResult, StatuslineError};
use crate::models::{ExtraUsage, RateLimitSnapshot, UsageWindow};

pub const USAGE_ENDPOINT: &str = "https://api.anthropic.com/api/oauth/usage";
const DEFAULT_USER_AGENT: &str = "claude-code";
const ANTHROPIC_BETA: &str = "oauth-2025-04-20";

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+(?:-[A-Za-z0-9.]+)?)").expect("version regex is valid")
});

/// `CLAUDE_STATUSLINE_USER_AGENT` wins; otherwise mirror the host's own
/// `claude-code/<version>` header.
pub fn resolve_user_agent(host_version: Option<&str>) -> String {
    if let Ok(value) = env::var("CLAUDE_STATUSLINE_USER_AGENT") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    host_version
        .and_then(extract_version)
        .map(|v| format!("{DEFAULT_USER_AGENT}/{v}"))
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
}

fn extract_version(text: &str) -> Option<String> {
    VERSION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Reset times come back a few hundred milliseconds before the hour; snap to
/// the nearest hour so countdowns don't flicker between renders.
pub fn normalize_reset_time(dt: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = dt
        .with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt);
    if dt.minute() >= 30 {
        truncated + TimeDelta::hours(1)
    } else {
        truncated
    }
}

#[derive(Debug, Deserialize)]
struct ExtraUsageDto {
    #[serde(default)]
    is_enabled: bool,
    monthly_limit: Option<f64>,
    used_credits: Option<f64>,
    utilization: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct UsageLimitDto {
    utilization: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UsageResponseDto {
    #[serde(default)]
    five_hour: Option<UsageLimitDto>,
    #[serde(default)]
    seven_day: Option<UsageLimitDto>,
    #[serde(default)]
    extra_usage: Option<ExtraUsageDto>,
}

impl From<UsageLimitDto> for UsageWindow {
    fn from(value: UsageLimitDto) -> Self {
        UsageWindow {
            utilization: value.utilization,
            resets_at: value.resets_at.map(normalize_reset_time),
        }
    }
}

/// Map a usage response body onto a snapshot.
pub fn parse_usage_response(body: &str) -> StatusResult<RateLimitSnapshot> {
    let dto: UsageResponseDto = serde_json::from_str(body)
        .map_err(|e| StatuslineError::RemoteFetchFailed(format!("malformed usage body: {e}")))?;
    let snapshot = RateLimitSnapshot {
        five_hour: dto.five_hour.map(UsageWindow::from).unwrap_or_default(),
        seven_day: dto.seven_day.map(UsageWindow::from).unwrap_or_default(),
        extra_usage: dto.extra_usage.map(|e| ExtraUsage {
            is_enabled: e.is_enabled,
            monthly_limit: e.monthly_limit,
            used_credits: e.used_credits,
            utilization: e.utilization,
        }),
    };
    if snapshot.is_empty() {
        return Err(StatuslineError::RemoteFetchFailed(
            "usage body carried no limits".into(),
        ));
    }
    Ok(snapshot)
}

/// Anything that can turn a credential into a rate-limit snapshot.
pub trait UsageSource {
    fn fetch(&self, credential: &Credential) -> StatusResult<RateLimitSnapshot>;
}

pub struct HttpUsageSource {
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl HttpUsageSource {
    pub fn new(user_agent: String, timeout: Duration) -> Self {
        Self {
            endpoint: USAGE_ENDPOINT.to_string(),
            user_agent,
            timeout,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl UsageSource for HttpUsageSource {
    fn fetch(&self, credential: &Credential) -> StatusResult<RateLimitSnapshot> {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build()
            .into();

        debug!(endpoint = %self.endpoint, "fetching usage limits");
        // Non-2xx statuses surface as errors here.
        let mut response = agent
            .get(&self.endpoint)
            .header("Authorization", format!("Bearer {}", credential.token()))
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/json")
            .header("anthropic-beta", ANTHROPIC_BETA)
            .call()
            .map_err(|e| StatuslineError::RemoteFetchFailed(e.to_string()))?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| StatuslineError::RemoteFetchFailed(e.to_string()))?;
        parse_usage_response(&body)
    }
}

fn deserialize_optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // An unparseable timestamp drops just that field, not the whole response.
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}
