//! Output from an execution backend

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Resource usage reported by a backend.
///
/// The mock fills these with placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceUsage {
    /// Peak resident memory in bytes
    pub peak_memory_bytes: u64,
    /// CPU time in milliseconds
    pub cpu_time_ms: u64,
}

/// Output from an execution backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SandboxOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit code
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether stdout was cut at `max_output_length`
    #[serde(default)]
    pub truncated: bool,
    /// Resource usage
    #[serde(default)]
    pub usage: ResourceUsage,
}

impl SandboxOutput {
    /// Create a successful output
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            duration_ms: 0,
            truncated: false,
            usage: ResourceUsage::default(),
        }
    }

    /// Create a failed output
    #[must_use]
    pub fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
            duration_ms: 0,
            truncated: false,
            usage: ResourceUsage::default(),
        }
    }

    /// Whether the process exited cleanly
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Cut stdout to at most `max_chars` characters
    pub fn truncate_stdout(&mut self, max_chars: usize) {
        if self.stdout.chars().count() > max_chars {
            self.stdout = self.stdout.chars().take(max_chars).collect();
            self.truncated = true;
        }
    }

    /// Get combined output
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}
