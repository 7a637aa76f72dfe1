//! Startup configuration checks

use super::config::AppConfig;
use anyhow::{bail, Result};
use tracing::warn;

/// Reject configurations the services cannot run with
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.server.port == 0 {
        bail!("server.port must not be 0");
    }
    if config.storage.default_page_size == 0 {
        bail!("storage.default_page_size must be at least 1");
    }
    if config.storage.max_page_size < config.storage.default_page_size {
        bail!(
            "storage.max_page_size ({}) must be >= storage.default_page_size ({})",
            config.storage.max_page_size,
            config.storage.default_page_size
        );
    }
    if config.execution.max_concurrent == 0 {
        bail!("execution.max_concurrent must be at least 1");
    }
    if config.execution.queue_capacity == 0 {
        bail!("execution.queue_capacity must be at least 1");
    }
    if config.execution.default_timeout_secs == 0
        || config.execution.default_timeout_secs > config.execution.max_timeout_secs
    {
        bail!(
            "execution.default_timeout_secs ({}) must be between 1 and execution.max_timeout_secs ({})",
            config.execution.default_timeout_secs,
            config.execution.max_timeout_secs
        );
    }
    if config.orchestration.run_timeout_secs == 0 {
        bail!("orchestration.run_timeout_secs must be at least 1");
    }
    if config.events.capacity == 0 {
        bail!("events.capacity must be at least 1");
    }

    let is_production = std::env::var("CONCLAVE_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);
    if is_production && config.server.cors_origins.iter().any(|o| o == "*") {
        warn!("CORS allows any origin in production. Set server.cors_origins explicitly.");
    }

    Ok(())
}
