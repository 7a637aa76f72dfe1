//! Conclave - Multi-Agent Coordination Hub
//!
//! CLI entry point for the Conclave server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use conclave::{cli, server};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let mut config = server::load_config()?;
    cli.apply_overrides(&mut config);

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = server::init_tracing(&config.logging)?;
    server::validate_config(&config)?;

    cli::run(cli, config).await
}
