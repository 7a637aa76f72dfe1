//! Server module for Conclave
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Startup configuration checks
//! - `logging`: Tracing subscriber setup
//! - `init`: Router construction and the run loop

pub mod config;
mod init;
mod loader;
mod logging;
mod validation;

pub use init::{build_router, run};
pub use loader::{embedded_defaults, load_config};
pub use logging::init_tracing;
pub use validation::validate_config;
