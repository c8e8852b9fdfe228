//! Diagnostic logging setup using `tracing-subscriber`.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary. Output goes to stderr so stdout stays free for command results.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialise stderr logging for the `launch-policy` command.
///
/// `RUST_LOG` wins over [`LoggingConfig::level`]. With
/// [`LoggingConfig::json`] set, events are written as JSON lines.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_cli(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}
