//! Logging setup for the server binary.

use std::io;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogConfig, LogFormat};

/// Install the global subscriber.
///
/// `RUST_LOG` directives win over `config.level`.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let default_level = parse_log_level(&config.level)?;
    let env_filter =
        EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stdout)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stdout).with_target(true))
            .try_init(),
    }
    .context("failed to install tracing subscriber")
}

fn parse_log_level(level: &str) -> Result<Level> {
    level.parse::<Level>().with_context(|| format!("invalid log level: {level}"))
}
