//! CLI module for Conclave
//!
//! Provides commands:
//! - `serve`: Start the HTTP and WebSocket server (default)
//! - `check-config`: Load and validate configuration, then exit

use clap::{Parser, Subcommand};

use crate::server::{self, config::AppConfig};

/// Conclave multi-agent coordination hub
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(about = "Multi-agent coordination hub")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve {
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate configuration and print the effective settings
    CheckConfig,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(Commands::Serve { port: Some(port) }) = self.command {
            config.server.port = port;
        }
    }
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::CheckConfig) => {
            print_summary(&config);
            Ok(())
        }
        Some(Commands::Serve { .. }) | None => server::run(config).await,
    }
}

fn print_summary(config: &AppConfig) {
    println!("Configuration OK");
    println!(
        "  server:        {}:{} (shutdown timeout {}s)",
        config.server.host, config.server.port, config.server.shutdown_timeout_secs
    );
    println!("  cors origins:  {}", config.server.cors_origins.join(", "));
    println!(
        "  page size:     default {}, max {}",
        config.storage.default_page_size, config.storage.max_page_size
    );
    println!(
        "  execution:     {} workers, queue {}, timeout {}s (max {}s)",
        config.execution.max_concurrent,
        config.execution.queue_capacity,
        config.execution.default_timeout_secs,
        config.execution.max_timeout_secs
    );
    println!("  seed agents:   {}", config.seed.default_agents);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["conclave"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["conclave", "serve", "--port", "9100"]).unwrap();
        let mut config = crate::server::embedded_defaults().unwrap();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_check_config_parses() {
        let cli = Cli::try_parse_from(["conclave", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }
}
