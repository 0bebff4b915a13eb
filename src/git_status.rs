//! Git-status cache: one entry per working directory, short TTL.

use std::path::Path;
use std::time::Duration;

use crate::cache::{CacheEntry, Clock};
use crate::git::StatusProbe;
use crate::models::GitState;
use crate::store::CacheStore;

pub const GIT_STATUS_TTL: Duration = Duration::from_secs(5);

pub fn cache_key(dir: &Path) -> String {
    format!("git_status:{}", dir.display())
}

pub struct GitStatusCache<'a> {
    store: &'a dyn CacheStore,
    clock: &'a dyn Clock,
    probe: &'a dyn StatusProbe,
    ttl: Duration,
}

impl<'a> GitStatusCache<'a> {
    pub fn new(
        store: &'a dyn CacheStore,
        clock: &'a dyn Clock,
        probe: &'a dyn StatusProbe,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            probe,
            ttl,
        }
    }

    /// Negative results are cached like positive ones. A failed probe falls
    /// back to the previous state for this directory, else `NotARepo`.
    pub fn get_git_status(&self, dir: &Path) -> GitState {
        let entry: CacheEntry<'_, GitState> =
            CacheEntry::new(self.store, self.clock, cache_key(dir), self.ttl);
        entry
            .get_or_refresh(|| self.probe.probe(dir))
            .into_payload()
            .unwrap_or(GitState::NotARepo)
    }
}
