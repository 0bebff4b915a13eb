//! Aggregation: query both caches for one session, then render.

use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::cache::Clock;
use crate::credentials::CredentialResolver;
use crate::display::{render, RenderOptions, RenderedStatus};
use crate::git::StatusProbe;
use crate::git_status::GitStatusCache;
use crate::models::{GitState, RateLimits, SessionSnapshot};
use crate::rate_limits::RateLimitCache;
use crate::store::CacheStore;
use crate::usage_api::UsageSource;

/// Everything the data layer needs for one render.
pub struct StatusSources<'a> {
    pub store: &'a dyn CacheStore,
    pub clock: &'a dyn Clock,
    pub resolver: &'a CredentialResolver,
    /// Custom `CLAUDE_CONFIG_DIR`, which selects the account's rate-limit slot
    pub config_dir: Option<&'a str>,
    /// `None` disables the usage API and its segments
    pub usage: Option<&'a dyn UsageSource>,
    pub probe: &'a dyn StatusProbe,
    pub rate_limit_ttl: Duration,
    pub git_ttl: Duration,
}

pub fn collect(
    session: &SessionSnapshot,
    sources: &StatusSources<'_>,
) -> (Option<RateLimits>, GitState) {
    let rate_limits = sources.usage.map(|usage| {
        RateLimitCache::new(
            sources.store,
            sources.clock,
            sources.resolver,
            usage,
            sources.rate_limit_ttl,
        )
        .for_config_dir(sources.config_dir)
        .get_rate_limits()
    });

    let git = match session.cwd.as_deref() {
        Some(cwd) => {
            GitStatusCache::new(sources.store, sources.clock, sources.probe, sources.git_ttl)
                .get_git_status(Path::new(cwd))
        }
        None => GitState::NotARepo,
    };

    let limits_state = match rate_limits.as_ref() {
        Some(RateLimits::Current(_)) => "current",
        Some(RateLimits::Stale(_)) => "stale",
        Some(RateLimits::Unknown) => "unknown",
        None => "disabled",
    };
    debug!(rate_limits = limits_state, repo = git.snapshot().is_some(), "sources collected");
    (rate_limits, git)
}

pub fn build_status(
    session: &SessionSnapshot,
    sources: &StatusSources<'_>,
    opts: &RenderOptions,
) -> RenderedStatus {
    let (rate_limits, git) = collect(session, sources);
    render(session, rate_limits.as_ref(), &git, opts)
}
