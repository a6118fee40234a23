//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Events go to stderr so the shell's table output on stdout stays readable.
//! `RUST_LOG` takes precedence over the verbosity flag.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Maps the `-v` count to a level: none is warn, `-v` debug, `-vv` trace.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_logging(verbosity: u8, no_color: bool) -> Result<(), String> {
    let level = level_from_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("artselect={}", level.as_str().to_lowercase())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("failed to initialise logging: {e}"))
}
