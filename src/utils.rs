use chrono::TimeDelta;
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::TimeFormatArg;

/// Claude data directories: the comma-separated override if any entry exists,
/// else `~/.claude` and `$XDG_CONFIG_HOME/claude` that exist.
pub fn claude_dirs(override_env: Option<&str>) -> Vec<PathBuf> {
    let mut paths = vec![];
    if let Some(list) = override_env {
        for p in list.split(',') {
            let p = p.trim();
            if p.is_empty() {
                continue;
            }
            let pb = PathBuf::from(p);
            if pb.is_dir() {
                paths.push(pb);
            }
        }
        if !paths.is_empty() {
            return paths;
        }
    }
    let Some(basedirs) = directories::BaseDirs::new() else {
        return paths;
    };
    let home = basedirs.home_dir().join(".claude");
    let xdg = basedirs.config_dir().join("claude");
    for base in [home, xdg] {
        if base.is_dir() && !paths.contains(&base) {
            paths.push(base);
        }
    }
    paths
}

pub fn home_dir() -> Option<String> {
    directories::BaseDirs::new().map(|b| b.home_dir().to_string_lossy().into_owned())
}

pub fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

/// Replace a leading home directory with `~`. Only whole path components match.
pub fn shorten_home(p: &str, home: Option<&str>) -> String {
    let Some(home) = home.map(|h| h.trim_end_matches('/')).filter(|h| !h.is_empty()) else {
        return p.to_owned();
    };
    match p.strip_prefix(home) {
        Some("") => "~".to_string(),
        Some(rest) if rest.starts_with('/') => format!("~{rest}"),
        _ => p.to_owned(),
    }
}

pub fn format_currency(v: f64) -> String {
    format!("{v:.2}")
}

/// Compact token count: `950`, `15.5k`, `1.2M`.
pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Time until a reset: `3d 4h`, `2h 0m`, `45m`, or `now` once passed.
pub fn format_countdown(remaining: TimeDelta) -> String {
    if remaining.num_seconds() <= 0 {
        return "now".to_string();
    }
    let total_minutes = remaining.num_minutes();
    let days = total_minutes / (60 * 24);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{}m", minutes.max(1))
    }
}

pub fn use_12h_clock(arg: TimeFormatArg) -> bool {
    match arg {
        TimeFormatArg::H12 => true,
        TimeFormatArg::H24 => false,
        TimeFormatArg::Auto => {
            if let Ok(forced) = env::var("CLAUDE_TIME_FORMAT") {
                forced.trim() == "12"
            } else {
                let lc = env::var("LC_TIME")
                    .or_else(|_| env::var("LANG"))
                    .unwrap_or_default()
                    .to_lowercase();
                lc.contains("en_us")
            }
        }
    }
}

pub fn parse_bool_env(var: &str) -> Option<bool> {
    let val = env::var(var).ok()?;
    match val.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// TTL from an env var in whole seconds, else `default`.
pub fn ttl_from_env(var: &str, default: Duration) -> Duration {
    env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn shortens_home_prefix_on_component_boundary() {
        assert_eq!(shorten_home("/home/me/proj", Some("/home/me")), "~/proj");
        assert_eq!(shorten_home("/home/me", Some("/home/me/")), "~");
        assert_eq!(shorten_home("/home/meadow/x", Some("/home/me")), "/home/meadow/x");
        assert_eq!(shorten_home("/repo", None), "/repo");
    }

    #[test]
    fn token_counts_are_compact() {
        assert_eq!(format_tokens(950), "950");
        assert_eq!(format_tokens(15_500), "15.5k");
        assert_eq!(format_tokens(200_000), "200.0k");
        assert_eq!(format_tokens(1_250_000), "1.2M");
    }

    #[test]
    fn countdown_formats() {
        assert_eq!(format_countdown(TimeDelta::hours(2)), "2h 0m");
        assert_eq!(format_countdown(TimeDelta::minutes(45)), "45m");
        assert_eq!(format_countdown(TimeDelta::seconds(20)), "1m");
        assert_eq!(format_countdown(TimeDelta::hours(75)), "3d 3h");
        assert_eq!(format_countdown(TimeDelta::minutes(-5)), "now");
    }

    #[test]
    fn explicit_clock_args_win() {
        assert!(use_12h_clock(TimeFormatArg::H12));
        assert!(!use_12h_clock(TimeFormatArg::H24));
    }

    #[test]
    fn override_dirs_must_exist() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        std::fs::create_dir(&a).unwrap();
        let list = format!("{}, {}", a.display(), temp.path().join("missing").display());
        assert_eq!(claude_dirs(Some(&list)), vec![a]);
    }

    #[test]
    #[serial_test::serial]
    fn ttl_env_override() {
        // SAFETY: Test runs serially, no concurrent env access
        unsafe { env::set_var("STATUSLINE_TEST_TTL", "15") };
        assert_eq!(
            ttl_from_env("STATUSLINE_TEST_TTL", Duration::from_secs(60)),
            Duration::from_secs(15)
        );
        unsafe { env::set_var("STATUSLINE_TEST_TTL", "soon") };
        assert_eq!(
            ttl_from_env("STATUSLINE_TEST_TTL", Duration::from_secs(60)),
            Duration::from_secs(60)
        );
        unsafe { env::remove_var("STATUSLINE_TEST_TTL") };
    }
}
