//! # Cache Module
//!
//! Generic time-to-live cache entry persisted through a [`CacheStore`].
//!
//! A read returns the stored payload while `now - refreshed_at < ttl`. Past
//! that, exactly one synchronous refresh runs. A successful refresh replaces
//! payload and timestamp in one store write; a failed refresh leaves the stored
//! entry untouched and hands back the previous payload, if any, together with
//! the error.

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, warn};

use crate::store::CacheStore;

/// Source of "now", injectable so TTL behaviour is testable without sleeping.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// On-store envelope: payload plus the timestamp and TTL that govern it.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<P> {
    payload: P,
    refreshed_at: DateTime<Utc>,
    ttl_secs: u64,
}

impl<P> StoredEntry<P> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        // A TTL too large for chrono counts as expired, as does a timestamp
        // from the future (clock stepped back).
        let Some(ttl) = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
        else {
            return false;
        };
        let age = now - self.refreshed_at;
        age >= TimeDelta::zero() && age < ttl
    }
}

/// Outcome of [`CacheEntry::get_or_refresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead<T, E> {
    /// Within TTL; no upstream call was made
    Fresh(T),
    /// Upstream call succeeded and the entry was replaced
    Refreshed(T),
    /// Upstream call failed; previous payload returned unchanged
    Stale { payload: T, error: E },
    /// Upstream call failed and nothing was cached
    Failed(E),
}

impl<T, E> CacheRead<T, E> {
    pub fn into_payload(self) -> Option<T> {
        match self {
            CacheRead::Fresh(p) | CacheRead::Refreshed(p) => Some(p),
            CacheRead::Stale { payload, .. } => Some(payload),
            CacheRead::Failed(_) => None,
        }
    }
}

/// One named slot in a store, holding a payload of type `T`.
pub struct CacheEntry<'a, T> {
    store: &'a dyn CacheStore,
    clock: &'a dyn Clock,
    key: String,
    ttl: Duration,
    _payload: PhantomData<fn() -> T>,
}

impl<'a, T> CacheEntry<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(
        store: &'a dyn CacheStore,
        clock: &'a dyn Clock,
        key: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            key: key.into(),
            ttl,
            _payload: PhantomData,
        }
    }

    /// Unreadable or undecodable entries are treated as a miss.
    fn load(&self) -> Option<StoredEntry<T>> {
        let raw = match self.store.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "cache store read failed");
                return None;
            }
        };
        match serde_json::from_str::<StoredEntry<T>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(key = %self.key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    fn persist(&self, payload: &T, refreshed_at: DateTime<Utc>) {
        let entry = StoredEntry {
            payload,
            refreshed_at,
            ttl_secs: self.ttl.as_secs(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.save(&self.key, &json));
        if let Err(e) = result {
            warn!(key = %self.key, error = %e, "cache store write failed");
        }
    }

    pub fn get_or_refresh<E, F>(&self, refresh: F) -> CacheRead<T, E>
    where
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        let now = self.clock.now();
        let current = match self.load() {
            Some(entry) if entry.is_fresh(now) => {
                debug!(key = %self.key, "cache hit");
                return CacheRead::Fresh(entry.payload);
            }
            other => other,
        };

        debug!(key = %self.key, cached = current.is_some(), "cache miss, refreshing");
        match refresh() {
            Ok(payload) => {
                self.persist(&payload, now);
                CacheRead::Refreshed(payload)
            }
            Err(error) => {
                warn!(key = %self.key, %error, "refresh failed");
                match current {
                    Some(entry) => CacheRead::Stale {
                        payload: entry.payload,
                        error,
                    },
                    None => CacheRead::Failed(error),
                }
            }
        }
    }
}
