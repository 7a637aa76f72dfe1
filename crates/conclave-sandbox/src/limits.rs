//! Resource limits attached to an execution request

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Resource limits for an execution.
///
/// Accepted and stored with every request. The mock backend only honours
/// `max_output_length`; the rest are carried for a real backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResourceLimits {
    /// Memory ceiling in megabytes (default: 256)
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: u64,
    /// CPU time ceiling in seconds (default: 30)
    #[serde(default = "default_max_cpu_seconds")]
    pub max_cpu_seconds: u64,
    /// Maximum number of characters kept from stdout (default: 64K)
    #[serde(default = "default_max_output_length")]
    pub max_output_length: usize,
}

fn default_max_memory_mb() -> u64 {
    256
}

fn default_max_cpu_seconds() -> u64 {
    30
}

fn default_max_output_length() -> usize {
    64 * 1024
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_memory_mb: default_max_memory_mb(),
            max_cpu_seconds: default_max_cpu_seconds(),
            max_output_length: default_max_output_length(),
        }
    }
}

impl ResourceLimits {
    /// Set the memory ceiling
    #[must_use]
    pub fn with_memory_mb(mut self, mb: u64) -> Self {
        self.max_memory_mb = mb;
        self
    }

    /// Set the CPU ceiling
    #[must_use]
    pub fn with_cpu_seconds(mut self, secs: u64) -> Self {
        self.max_cpu_seconds = secs;
        self
    }

    /// Set the output ceiling
    #[must_use]
    pub fn with_output_length(mut self, len: usize) -> Self {
        self.max_output_length = len;
        self
    }
}
