use anyhow::Result;
use chrono::Utc;
use tracing::{debug, warn};

use claude_statusbar::cache::SystemClock;
use claude_statusbar::cli::{Args, CacheBackendArg};
use claude_statusbar::credentials::CredentialResolver;
use claude_statusbar::db::SqliteStore;
use claude_statusbar::display::RenderOptions;
use claude_statusbar::git::GitCli;
use claude_statusbar::git_status::GIT_STATUS_TTL;
use claude_statusbar::logging::init_logging;
use claude_statusbar::models::SessionSnapshot;
use claude_statusbar::rate_limits::RATE_LIMIT_TTL;
use claude_statusbar::status::{build_status, StatusSources};
use claude_statusbar::store::{CacheStore, FileStore, MemoryStore};
use claude_statusbar::usage_api::{resolve_user_agent, HttpUsageSource, UsageSource};
use claude_statusbar::utils::{claude_dirs, home_dir, read_stdin, ttl_from_env, use_12h_clock};

/// A store that cannot be opened degrades to process-local caching.
fn open_store(args: &Args) -> Box<dyn CacheStore> {
    match args.cache_backend {
        CacheBackendArg::Sqlite => match SqliteStore::open_default() {
            Ok(store) => {
                debug!(path = %store.path().display(), "sqlite cache opened");
                Box::new(store)
            }
            Err(e) => {
                warn!(error = %e, "sqlite cache unavailable, using memory");
                Box::new(MemoryStore::new())
            }
        },
        CacheBackendArg::File => {
            let dir = args.cache_dir.clone().or_else(|| {
                directories::BaseDirs::new().map(|b| b.cache_dir().join("claude-statusline"))
            });
            match dir {
                Some(dir) => {
                    let store = FileStore::new(dir);
                    debug!(dir = %store.dir().display(), "file cache selected");
                    Box::new(store)
                }
                None => Box::new(MemoryStore::new()),
            }
        }
        CacheBackendArg::Memory => Box::new(MemoryStore::new()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Invalid input is the only error that reaches the process boundary.
    let stdin = read_stdin()?;
    let session = SessionSnapshot::from_slice(&stdin)?;

    let store = open_store(&args);
    let clock = SystemClock;
    let dirs = claude_dirs(args.claude_config_dir.as_deref());
    let resolver = CredentialResolver::standard(&dirs, args.git_timeout());
    let http = HttpUsageSource::new(
        resolve_user_agent(session.version.as_deref()),
        args.http_timeout(),
    );
    let probe = GitCli::new(args.git_timeout());
    // Same variable the OS store keys its entry on.
    let config_dir = std::env::var("CLAUDE_CONFIG_DIR").ok();

    let sources = StatusSources {
        store: &*store,
        clock: &clock,
        resolver: &resolver,
        config_dir: config_dir.as_deref(),
        usage: args.fetch_enabled().then_some(&http as &dyn UsageSource),
        probe: &probe,
        rate_limit_ttl: ttl_from_env("CLAUDE_USAGE_CACHE_TTL", RATE_LIMIT_TTL),
        git_ttl: ttl_from_env("CLAUDE_GIT_CACHE_TTL", GIT_STATUS_TTL),
    };
    let opts = RenderOptions {
        now: Utc::now(),
        home: home_dir(),
        use_12h: use_12h_clock(args.time_fmt),
    };

    let status = build_status(&session, &sources, &opts);
    print!("{}", status.to_text(args.colors_enabled(), !args.no_links));
    Ok(())
}
