use std::path::PathBuf;
use std::time::Duration;

use crate::utils::parse_bool_env;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormatArg {
    Auto,
    #[value(name = "12h")]
    H12,
    #[value(name = "24h")]
    H24,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendArg {
    /// Shared SQLite database (default)
    Sqlite,
    /// One JSON file per entry, replaced atomically
    File,
    /// Process-local only; every render refreshes
    Memory,
}

#[derive(clap::Parser, Debug)]
#[command(version, about = "Two-line status bar for Claude Code sessions")]
pub struct Args {
    /// Claude data path(s), comma-separated. Defaults to ~/.claude and ~/.config/claude
    #[arg(long, env = "CLAUDE_CONFIG_DIR")]
    pub claude_config_dir: Option<String>,

    /// Where cache entries persist between renders: sqlite|file|memory
    #[arg(
        long = "cache",
        value_enum,
        env = "CLAUDE_STATUSLINE_CACHE",
        default_value_t = CacheBackendArg::Sqlite
    )]
    pub cache_backend: CacheBackendArg,

    /// Directory for the file cache backend
    #[arg(long, env = "CLAUDE_STATUSLINE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Time display: auto|12h|24h
    #[arg(long = "time", value_enum, default_value_t = TimeFormatArg::Auto)]
    pub time_fmt: TimeFormatArg,

    /// Skip the usage API entirely (or set CLAUDE_STATUSLINE_FETCH_USAGE=0)
    #[arg(long)]
    pub no_fetch: bool,

    /// Disable ANSI colors (NO_COLOR is honored as well)
    #[arg(long)]
    pub no_color: bool,

    /// Disable OSC-8 hyperlinks
    #[arg(long)]
    pub no_links: bool,

    /// Usage API timeout in seconds
    #[arg(long, default_value_t = 3)]
    pub http_timeout: u64,

    /// Timeout in seconds for each git / credential-store subprocess
    #[arg(long, default_value_t = 3)]
    pub git_timeout: u64,

    /// Debug mode: log cache and fetch decisions to stderr
    #[arg(long, env = "CLAUDE_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }

    pub fn fetch_enabled(&self) -> bool {
        !self.no_fetch && parse_bool_env("CLAUDE_STATUSLINE_FETCH_USAGE").unwrap_or(true)
    }

    pub fn colors_enabled(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout.max(1))
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout.max(1))
    }
}
