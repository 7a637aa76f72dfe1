//! Executor trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{Language, ResourceLimits, Result, SandboxOutput};

/// A single unit of work handed to a backend
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Source language
    pub language: Language,
    /// Source code
    pub code: String,
    /// Limits attached to the request
    pub limits: ResourceLimits,
}

impl ExecutionRequest {
    /// Create a request with default limits
    pub fn new(language: Language, code: impl Into<String>) -> Self {
        Self {
            language,
            code: code.into(),
            limits: ResourceLimits::default(),
        }
    }

    /// Attach limits
    #[must_use]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Backend that runs (or pretends to run) source code.
///
/// Implementations must return promptly once `cancel` fires, either with
/// [`crate::Error::Cancelled`] or with the output produced so far. Wall-clock
/// timeouts are enforced by the caller.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Run the request
    async fn execute(
        &self,
        request: &ExecutionRequest,
        cancel: CancellationToken,
    ) -> Result<SandboxOutput>;
}
