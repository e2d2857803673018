//! Structured logging using tracing.
//!
//! Pretty output for development, JSON lines for log aggregation.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::MonitoringConfig;

/// Build the level filter: `RUST_LOG` first, the configured filter otherwise.
pub fn env_filter(config: &MonitoringConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &MonitoringConfig) -> anyhow::Result<()> {
    let json_layer = config.json_logs.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
    });
    let pretty_layer = (!config.json_logs).then(|| fmt::layer().with_target(true));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json_layer)
        .with(pretty_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    info!(
        service_name = %config.service_name,
        log_format = if config.json_logs { "json" } else { "pretty" },
        "Logging initialized"
    );

    Ok(())
}
