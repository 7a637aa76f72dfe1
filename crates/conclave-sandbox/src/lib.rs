//! Conclave Sandbox - code execution backends
//!
//! This crate defines the [`CodeExecutor`] seam used by the execution
//! pipeline and ships one backend, [`MockExecutor`], which never runs code.
//! It pattern-matches the source for print statements and error raises and
//! fabricates an output from them.
//!
//! A container-based backend would implement the same trait.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod executor;
mod language;
mod limits;
mod mock;
mod output;

#[cfg(test)]
mod tests;

pub use executor::{CodeExecutor, ExecutionRequest};
pub use language::Language;
pub use limits::ResourceLimits;
pub use mock::{MockExecutor, MockExecutorConfig};
pub use output::{ResourceUsage, SandboxOutput};

use thiserror::Error;

/// Sandbox error type
#[derive(Debug, Error)]
pub enum Error {
    /// The language tag is not one the sandbox knows about
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Execution was cancelled before it finished
    #[error("execution cancelled")]
    Cancelled,

    /// The backend failed to run the code at all
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
