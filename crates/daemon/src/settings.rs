//! Configuration loading for the consumer daemon
//!
//! Sources, lowest to highest precedence:
//! 1. Optional TOML file (`RESTQ_CONFIG`, default `~/.restq/consumer.toml`)
//! 2. `RESTQ_*` environment variables (`RESTQ_ADDRS` is comma-separated)

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use restq_core::domain::QueueConfig;
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "RESTQ";
pub const DEFAULT_CONFIG_PATH: &str = "~/.restq/consumer.toml";

/// Resolve the config file path from `RESTQ_CONFIG` or the default
pub fn config_path() -> String {
    let raw = std::env::var("RESTQ_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    shellexpand::tilde(&raw).into_owned()
}

/// Load from the process environment
pub fn load(path: &str) -> Result<QueueConfig> {
    load_with(path, None)
}

/// Load with an explicit environment map (None reads the process environment)
pub fn load_with(path: &str, env: Option<HashMap<String, String>>) -> Result<QueueConfig> {
    let environment = Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("addrs")
        .source(env);

    let config: QueueConfig = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(false))
        .add_source(environment)
        .build()
        .context("failed to read consumer configuration")?
        .try_deserialize()
        .context("invalid consumer configuration")?;

    config.validate()?;
    Ok(config)
}
