//! Logging and tracing setup

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize logging and tracing.
///
/// Diagnostics go to stderr in all formats: stdout carries the
/// response lines when no output file is given. The `VELOCITY_LOG`
/// environment variable overrides the configured level filter.
pub fn initialize_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("VELOCITY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        _ => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .boxed(),
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    Ok(())
}
