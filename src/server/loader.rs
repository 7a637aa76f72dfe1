//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let env = std::env::var("CONCLAVE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = Config::builder()
        // 1. Embedded defaults
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. File overrides
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", env)).required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. CONCLAVE_SERVER__PORT style variables
        .add_source(
            Environment::with_prefix("CONCLAVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("server.cors_origins"),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Parse the embedded defaults alone
pub fn embedded_defaults() -> Result<AppConfig> {
    Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize embedded defaults")
}
