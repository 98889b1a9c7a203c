//! Logging setup for the command-line front end.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when neither `RUST_LOG` nor `-v`/`-q` say otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Map `-v`/`-q` counts onto a level name.
pub fn level_for(verbose: u8, quiet: u8) -> &'static str {
    match (verbose, quiet) {
        (_, q) if q > 1 => "off",
        (_, 1) => "error",
        (0, _) => DEFAULT_LOG_LEVEL,
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    }
}

/// Install a stderr fmt subscriber. `RUST_LOG` wins over `level`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
