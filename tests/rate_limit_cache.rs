mod common;

use std::time::Duration;

use claude_statusbar::credentials::CredentialResolver;
use claude_statusbar::error::StatuslineError;
use claude_statusbar::models::{RateLimitSnapshot, RateLimits, UsageWindow};
use claude_statusbar::rate_limits::{RATE_LIMIT_CACHE_KEY, RATE_LIMIT_TTL, RateLimitCache};
use claude_statusbar::store::{CacheStore, MemoryStore};
use common::{FakeClock, ScriptedUsage, StaticCredential, utc};

fn snapshot(short: f64, weekly: f64) -> RateLimitSnapshot {
    RateLimitSnapshot {
        five_hour: UsageWindow {
            utilization: Some(short),
            resets_at: Some(utc("2025-10-18T14:00:00Z")),
        },
        seven_day: UsageWindow {
            utilization: Some(weekly),
            resets_at: Some(utc("2025-10-21T14:00:00Z")),
        },
        extra_usage: None,
    }
}

fn resolver(token: Option<&'static str>) -> CredentialResolver {
    CredentialResolver::new(vec![
        Box::new(StaticCredential(None)),
        Box::new(StaticCredential(token)),
    ])
}

#[test]
fn reads_within_ttl_are_identical_and_free() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let creds = resolver(Some("tok"));
    let usage = ScriptedUsage::default();
    usage.push(Ok(snapshot(55.0, 82.0)));
    let cache = RateLimitCache::new(&store, &clock, &creds, &usage, RATE_LIMIT_TTL);

    let first = cache.get_rate_limits();
    let raw_after_first = store.load(RATE_LIMIT_CACHE_KEY).unwrap();
    clock.advance(30);
    let second = cache.get_rate_limits();

    assert_eq!(first, RateLimits::Current(snapshot(55.0, 82.0)));
    assert_eq!(first, second);
    assert_eq!(usage.calls(), 1);
    assert_eq!(store.load(RATE_LIMIT_CACHE_KEY).unwrap(), raw_after_first);
    assert_eq!(usage.tokens.borrow().as_slice(), ["tok".to_string()]);
}

#[test]
fn expiry_refreshes_once() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let creds = resolver(Some("tok"));
    let usage = ScriptedUsage::default();
    usage.push(Ok(snapshot(10.0, 20.0)));
    usage.push(Ok(snapshot(11.0, 21.0)));
    let cache = RateLimitCache::new(&store, &clock, &creds, &usage, RATE_LIMIT_TTL);

    cache.get_rate_limits();
    clock.advance(61);
    assert_eq!(cache.get_rate_limits(), RateLimits::Current(snapshot(11.0, 21.0)));
    assert_eq!(cache.get_rate_limits(), RateLimits::Current(snapshot(11.0, 21.0)));
    assert_eq!(usage.calls(), 2);
}

#[test]
fn failed_fetch_serves_last_good_snapshot() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let creds = resolver(Some("tok"));
    let usage = ScriptedUsage::default();
    usage.push(Ok(snapshot(40.0, 50.0)));
    usage.push(Err(StatuslineError::RemoteFetchFailed("http status 503".into())));
    let cache = RateLimitCache::new(&store, &clock, &creds, &usage, RATE_LIMIT_TTL);

    cache.get_rate_limits();
    let raw = store.load(RATE_LIMIT_CACHE_KEY).unwrap();
    clock.advance(120);

    assert_eq!(cache.get_rate_limits(), RateLimits::Stale(snapshot(40.0, 50.0)));
    assert_eq!(usage.calls(), 2);
    assert_eq!(store.load(RATE_LIMIT_CACHE_KEY).unwrap(), raw, "entry untouched");
}

#[test]
fn failed_first_fetch_is_unknown() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let creds = resolver(Some("tok"));
    let usage = ScriptedUsage::default();
    usage.push(Err(StatuslineError::RemoteFetchFailed("timeout".into())));
    let cache = RateLimitCache::new(&store, &clock, &creds, &usage, RATE_LIMIT_TTL);

    assert_eq!(cache.get_rate_limits(), RateLimits::Unknown);
    assert!(store.is_empty());
}

#[test]
fn missing_credential_skips_the_network() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let usage = ScriptedUsage::default();
    usage.push(Ok(snapshot(1.0, 2.0)));

    let no_creds = resolver(None);
    let cache = RateLimitCache::new(&store, &clock, &no_creds, &usage, RATE_LIMIT_TTL);
    assert_eq!(cache.get_rate_limits(), RateLimits::Unknown);
    assert_eq!(usage.calls(), 0);
}

#[test]
fn missing_credential_keeps_stale_snapshot() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let usage = ScriptedUsage::default();
    usage.push(Ok(snapshot(33.0, 44.0)));

    let creds = resolver(Some("tok"));
    RateLimitCache::new(&store, &clock, &creds, &usage, RATE_LIMIT_TTL).get_rate_limits();

    clock.advance(3600);
    let no_creds = resolver(None);
    let cache = RateLimitCache::new(&store, &clock, &no_creds, &usage, RATE_LIMIT_TTL);
    assert_eq!(cache.get_rate_limits(), RateLimits::Stale(snapshot(33.0, 44.0)));
    assert_eq!(usage.calls(), 1);
}

#[test]
fn custom_ttl_is_respected() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let creds = resolver(Some("tok"));
    let usage = ScriptedUsage::default();
    usage.push(Ok(snapshot(1.0, 1.0)));
    usage.push(Ok(snapshot(2.0, 2.0)));
    let cache = RateLimitCache::new(&store, &clock, &creds, &usage, Duration::from_secs(10));

    cache.get_rate_limits();
    clock.advance(10);
    assert_eq!(cache.get_rate_limits(), RateLimits::Current(snapshot(2.0, 2.0)));
}

#[test]
fn config_dirs_keep_separate_slots() {
    let store = MemoryStore::new();
    let clock = FakeClock::at("2025-10-18T12:00:00Z");
    let creds = resolver(Some("tok"));
    let usage = ScriptedUsage::default();
    usage.push(Ok(snapshot(10.0, 10.0)));
    usage.push(Ok(snapshot(90.0, 90.0)));

    let work = RateLimitCache::new(&store, &clock, &creds, &usage, RATE_LIMIT_TTL)
        .for_config_dir(Some("/home/me/.claude-work"));
    let home = RateLimitCache::new(&store, &clock, &creds, &usage, RATE_LIMIT_TTL)
        .for_config_dir(Some("/home/me/.claude-home"));

    assert_eq!(work.get_rate_limits(), RateLimits::Current(snapshot(10.0, 10.0)));
    assert_eq!(home.get_rate_limits(), RateLimits::Current(snapshot(90.0, 90.0)));
    assert_eq!(work.get_rate_limits(), RateLimits::Current(snapshot(10.0, 10.0)));
    assert_eq!(usage.calls(), 2);
    assert_eq!(store.len(), 2);
    assert!(store.load(RATE_LIMIT_CACHE_KEY).unwrap().is_none());
}
