//! Server configuration types
//!
//! Every section has serde defaults, so a partial file or an empty
//! environment still deserializes.

use conclave_core::{ExecutionConfig, HubConfig, OrchestrationConfig, PageLimits};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub execution: ExecutionAppConfig,
    #[serde(default)]
    pub orchestration: OrchestrationAppConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Settings for the service hub
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            limits: PageLimits {
                default_take: self.storage.default_page_size,
                max_take: self.storage.max_page_size,
            },
            execution: ExecutionConfig {
                max_concurrent: self.execution.max_concurrent,
                queue_capacity: self.execution.queue_capacity,
                default_timeout_secs: self.execution.default_timeout_secs,
                max_timeout_secs: self.execution.max_timeout_secs,
            },
            mock_execution_delay: Duration::from_millis(self.execution.mock_delay_ms),
            orchestration: OrchestrationConfig {
                turn_delay: Duration::from_millis(self.orchestration.turn_delay_ms),
                run_timeout: Duration::from_secs(self.orchestration.run_timeout_secs),
            },
            event_capacity: self.events.capacity,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty or `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// How long shutdown waits for running executions
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Pagination limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    50
}

fn default_max_page_size() -> usize {
    200
}

/// Execution pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionAppConfig {
    /// Executions running at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    #[serde(default = "default_max_timeout_secs")]
    pub max_timeout_secs: u64,
    /// Simulated run time of the mock executor
    #[serde(default = "default_mock_delay_ms")]
    pub mock_delay_ms: u64,
}

impl Default for ExecutionAppConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
            default_timeout_secs: default_timeout_secs(),
            max_timeout_secs: default_max_timeout_secs(),
            mock_delay_ms: default_mock_delay_ms(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_timeout_secs() -> u64 {
    300
}

fn default_mock_delay_ms() -> u64 {
    100
}

/// Team run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationAppConfig {
    #[serde(default)]
    pub turn_delay_ms: u64,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl Default for OrchestrationAppConfig {
    fn default() -> Self {
        Self {
            turn_delay_ms: 0,
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

fn default_run_timeout_secs() -> u64 {
    30
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_event_capacity() -> usize {
    256
}

/// Startup seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Create the four supply-chain agents at startup
    #[serde(default = "default_true")]
    pub default_agents: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            default_agents: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
    /// Also write daily-rotated files here
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
            directory: None,
        }
    }
}

fn default_log_filter() -> String {
    "conclave=info,conclave_core=info,tower_http=info".to_string()
}
