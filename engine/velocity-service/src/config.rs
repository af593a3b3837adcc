//! Service configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use account_store::StoreConfig;
use velocity_core::VelocityLimits;

use crate::pipeline::PipelineConfig;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Velocity cap configuration
    pub limits: VelocityLimits,

    /// Account store expiration configuration
    pub store: StoreConfig,

    /// Line pipeline configuration
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Load configuration from an optional TOML file and environment variables
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => ServiceConfig::default(),
    };

    load_from_env(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file
fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Override configuration from environment variables
fn load_from_env(config: &mut ServiceConfig) -> Result<()> {
    if let Ok(level) = std::env::var("VELOCITY_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("VELOCITY_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Ok(workers) = std::env::var("VELOCITY_WORKERS") {
        config.pipeline.workers =
            workers.parse().context("VELOCITY_WORKERS must be a positive integer")?;
    }

    if let Ok(ttl) = std::env::var("VELOCITY_STORE_TTL_SECS") {
        config.store.ttl_secs =
            ttl.parse().context("VELOCITY_STORE_TTL_SECS must be a whole number of seconds")?;
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &ServiceConfig) -> Result<()> {
    config.limits.validate().context("Invalid velocity limits")?;

    if config.pipeline.workers == 0 {
        return Err(anyhow::anyhow!("Pipeline worker count must be at least 1"));
    }

    if config.pipeline.channel_capacity == 0 {
        return Err(anyhow::anyhow!("Pipeline channel capacity must be at least 1"));
    }

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    Ok(())
}
