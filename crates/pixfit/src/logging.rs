//! Logging initialization.
//!
//! Structured logging via the `tracing` ecosystem, written to stderr so
//! stdout stays reserved for data output (plan JSON, config dumps).

use pixfit_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem from the configured settings, with CLI
/// overrides for verbosity and JSON output.
///
/// The `RUST_LOG` environment variable, when set, wins over both.
pub fn init(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(effective_level(config, verbose)));

    if json_logs || config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// The level the filter starts from: `--verbose` floors it at debug but
/// never lowers a more detailed configured level.
fn effective_level<'a>(config: &'a LoggingConfig, verbose: bool) -> &'a str {
    if verbose && config.level != "trace" {
        "debug"
    } else {
        config.level.as_str()
    }
}
