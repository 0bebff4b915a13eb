//! Rate-limit cache: at most one usage API call per TTL, whatever the render rate.

use std::time::Duration;

use crate::cache::{CacheEntry, CacheRead, Clock};
use crate::credentials::{CredentialResolver, config_dir_suffix};
use crate::models::{RateLimitSnapshot, RateLimits};
use crate::store::CacheStore;
use crate::usage_api::UsageSource;

pub const RATE_LIMIT_CACHE_KEY: &str = "oauth_usage_summary";
pub const RATE_LIMIT_TTL: Duration = Duration::from_secs(60);

/// Limits belong to an account, so each custom `CLAUDE_CONFIG_DIR` gets its
/// own slot, suffixed like its keychain entry.
pub fn rate_limit_cache_key(config_dir: Option<&str>) -> String {
    match config_dir_suffix(config_dir) {
        Some(suffix) => format!("{RATE_LIMIT_CACHE_KEY}:{suffix}"),
        None => RATE_LIMIT_CACHE_KEY.to_string(),
    }
}

pub struct RateLimitCache<'a> {
    store: &'a dyn CacheStore,
    clock: &'a dyn Clock,
    key: String,
    ttl: Duration,
    resolver: &'a CredentialResolver,
    source: &'a dyn UsageSource,
}

impl<'a> RateLimitCache<'a> {
    pub fn new(
        store: &'a dyn CacheStore,
        clock: &'a dyn Clock,
        resolver: &'a CredentialResolver,
        source: &'a dyn UsageSource,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            key: RATE_LIMIT_CACHE_KEY.to_string(),
            ttl,
            resolver,
            source,
        }
    }

    pub fn for_config_dir(mut self, config_dir: Option<&str>) -> Self {
        self.key = rate_limit_cache_key(config_dir);
        self
    }

    /// The credential is only resolved when the entry needs refreshing. A
    /// missing credential or failed fetch falls back to the last good
    /// snapshot, else [`RateLimits::Unknown`].
    pub fn get_rate_limits(&self) -> RateLimits {
        let entry: CacheEntry<'_, RateLimitSnapshot> =
            CacheEntry::new(self.store, self.clock, self.key.as_str(), self.ttl);
        let read = entry.get_or_refresh(|| {
            let credential = self.resolver.resolve()?;
            self.source.fetch(&credential)
        });
        match read {
            CacheRead::Fresh(snapshot) | CacheRead::Refreshed(snapshot) => {
                RateLimits::Current(snapshot)
            }
            CacheRead::Stale { payload, .. } => RateLimits::Stale(payload),
            CacheRead::Failed(_) => RateLimits::Unknown,
        }
    }
}
