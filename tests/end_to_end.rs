mod common;

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use chrono::TimeDelta;
use claude_statusbar::credentials::CredentialResolver;
use claude_statusbar::display::{ColorClass, RenderOptions, weekly_reset};
use claude_statusbar::models::{
    GitState, GitStatusSnapshot, RateLimitSnapshot, SessionSnapshot, UsageWindow,
};
use claude_statusbar::status::{StatusSources, build_status};
use claude_statusbar::store::MemoryStore;
use claude_statusbar::usage_api::UsageSource;
use common::{FakeClock, ScriptedProbe, ScriptedUsage, StaticCredential};
use serde_json::json;

const NOW: &str = "2025-10-18T12:00:00Z";

fn session() -> SessionSnapshot {
    SessionSnapshot::from_value(&json!({
        "model": "claude-x",
        "cwd": "/repo",
        "tokens_used": 160000,
        "tokens_total": 200000
    }))
    .unwrap()
}

fn repo() -> GitState {
    GitState::Repo(GitStatusSnapshot {
        branch: "main".into(),
        staged: 2,
        modified: 1,
        untracked: 0,
        lines_added: 10,
        lines_removed: 3,
        web_url: Some("https://github.com/acme/widgets".into()),
        ..Default::default()
    })
}

fn limits(clock: &FakeClock) -> RateLimitSnapshot {
    use claude_statusbar::cache::Clock;
    RateLimitSnapshot {
        five_hour: UsageWindow {
            utilization: Some(55.0),
            resets_at: Some(clock.now() + TimeDelta::hours(2)),
        },
        seven_day: UsageWindow {
            utilization: Some(82.0),
            resets_at: Some(clock.now() + TimeDelta::days(3)),
        },
        extra_usage: None,
    }
}

fn opts(clock: &FakeClock) -> RenderOptions {
    use claude_statusbar::cache::Clock;
    RenderOptions {
        now: clock.now(),
        home: None,
        use_12h: false,
    }
}

#[test]
fn renders_full_scenario() {
    let store = MemoryStore::new();
    let clock = FakeClock::at(NOW);
    let resolver = CredentialResolver::new(vec![Box::new(StaticCredential(Some("tok")))]);
    let usage = ScriptedUsage::default();
    usage.push(Ok(limits(&clock)));
    let probe = ScriptedProbe::default();
    probe.push(Ok(repo()));

    let sources = StatusSources {
        store: &store,
        clock: &clock,
        resolver: &resolver,
        config_dir: None,
        usage: Some(&usage as &dyn UsageSource),
        probe: &probe,
        rate_limit_ttl: Duration::from_secs(60),
        git_ttl: Duration::from_secs(5),
    };
    let status = build_status(&session(), &sources, &opts(&clock));

    assert_eq!(
        status.line1.plain(),
        "claude-x | /repo | main +2 ~1 | +10/-3"
    );
    let branch = status
        .line1
        .segments
        .iter()
        .find(|s| s.text == "main")
        .unwrap();
    assert_eq!(
        branch.link.as_deref(),
        Some("https://github.com/acme/widgets/tree/main")
    );

    let weekly = weekly_reset(limits(&clock).seven_day.resets_at.unwrap(), false);
    assert_eq!(
        status.line2.plain(),
        format!("ctx 100% 160.0k/200.0k | 5h 55% (2h 0m) | 7d 82% ({weekly})")
    );
    let color_of = |text: &str| {
        status
            .line2
            .segments
            .iter()
            .find(|s| s.text == text)
            .and_then(|s| s.color)
    };
    assert_eq!(color_of("100%"), Some(ColorClass::Red));
    assert_eq!(color_of("55%"), Some(ColorClass::Green));
    assert_eq!(color_of("82%"), Some(ColorClass::Yellow));

    // Second render inside both TTLs touches neither source.
    clock.advance(2);
    let again = build_status(&session(), &sources, &opts(&clock));
    assert_eq!(again.line1, status.line1);
    assert_eq!(usage.calls(), 1);
    assert_eq!(probe.calls(), 1);
}

#[test]
fn missing_credentials_render_placeholder() {
    let store = MemoryStore::new();
    let clock = FakeClock::at(NOW);
    let resolver = CredentialResolver::new(vec![Box::new(StaticCredential(None))]);
    let usage = ScriptedUsage::default();
    let probe = ScriptedProbe::default();
    probe.push(Ok(GitState::NotARepo));

    let sources = StatusSources {
        store: &store,
        clock: &clock,
        resolver: &resolver,
        config_dir: None,
        usage: Some(&usage as &dyn UsageSource),
        probe: &probe,
        rate_limit_ttl: Duration::from_secs(60),
        git_ttl: Duration::from_secs(5),
    };
    let status = build_status(&session(), &sources, &opts(&clock));

    assert_eq!(status.line1.plain(), "claude-x | /repo");
    assert_eq!(status.line2.plain(), "ctx 100% 160.0k/200.0k | limits: n/a");
    assert_eq!(usage.calls(), 0);
}

#[test]
fn disabled_fetching_omits_usage_segments() {
    let store = MemoryStore::new();
    let clock = FakeClock::at(NOW);
    let resolver = CredentialResolver::new(Vec::new());
    let probe = ScriptedProbe::default();
    probe.push(Ok(GitState::NotARepo));

    let sources = StatusSources {
        store: &store,
        clock: &clock,
        resolver: &resolver,
        config_dir: None,
        usage: None,
        probe: &probe,
        rate_limit_ttl: Duration::from_secs(60),
        git_ttl: Duration::from_secs(5),
    };
    let status = build_status(&session(), &sources, &opts(&clock));
    assert_eq!(status.line2.plain(), "ctx 100% 160.0k/200.0k");
}

fn run_binary(input: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_claude_statusbar"))
        .args(["--no-fetch", "--cache", "memory", "--no-color", "--no-links"])
        .env_remove("CLAUDE_DEBUG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn binary_prints_two_lines() {
    let out = run_binary(
        r#"{"model":{"id":"claude-sonnet-4-5","display_name":"Sonnet 4.5"},
            "cwd":"/definitely/not/a/repo","tokens_used":80000,"tokens_total":200000,
            "cost":{"total_cost_usd":0.5}}"#,
    );
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Sonnet 4.5 | $0.50 | "));
    assert!(lines[0].ends_with("/definitely/not/a/repo"));
    assert_eq!(lines[1], "ctx 50% 80.0k/200.0k");
}

#[test]
fn binary_rejects_invalid_input() {
    for input in ["", "not json", r#"{"cwd":"/repo"}"#] {
        let out = run_binary(input);
        assert!(!out.status.success(), "input {input:?} should fail");
        assert!(out.stdout.is_empty(), "input {input:?} printed output");
    }
}
