//! Diagnostics go to stderr only; stdout carries nothing but the two lines.

use tracing_subscriber::EnvFilter;

/// Off unless `--debug` is given or `RUST_LOG` is set.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "claude_statusbar=debug" } else { "off" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
