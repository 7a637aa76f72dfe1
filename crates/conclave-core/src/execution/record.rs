use chrono::{DateTime, Utc};
use conclave_sandbox::{Language, ResourceLimits, SandboxOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::repository::Entity;

/// Lifecycle of an execution record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Stored and queued
    Pending,
    /// Handed to the executor
    Running,
    /// Exit code 0
    Completed,
    /// Non-zero exit code or executor error
    Failed,
    /// Exceeded its timeout
    Timeout,
    /// Cancelled by a caller or by shutdown
    Cancelled,
}

impl ExecutionStatus {
    /// All statuses
    pub const ALL: [ExecutionStatus; 6] = [
        ExecutionStatus::Pending,
        ExecutionStatus::Running,
        ExecutionStatus::Completed,
        ExecutionStatus::Failed,
        ExecutionStatus::Timeout,
        ExecutionStatus::Cancelled,
    ];

    /// Whether no further transition is possible
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Timeout | Self::Cancelled
        )
    }

    /// Allowed moves: Pending -> Running | Cancelled, Running -> any terminal
    #[must_use]
    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Running | Self::Cancelled),
            Self::Running => next.is_terminal(),
            _ => false,
        }
    }

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked request to run source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExecutionRecord {
    /// Execution ID
    pub id: Uuid,
    /// Source language
    pub language: Language,
    /// Source code
    pub code: String,
    /// Conversation the execution belongs to
    pub conversation_id: Option<Uuid>,
    /// Agent that asked for it
    pub requesting_agent_id: Option<Uuid>,
    /// Wall-clock limit in seconds
    pub timeout_seconds: u64,
    /// Resource limits handed to the executor
    pub limits: ResourceLimits,
    /// Current status
    pub status: ExecutionStatus,
    /// Executor output, once there is one
    pub result: Option<SandboxOutput>,
    /// Why the execution ended without output
    pub error: Option<String>,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// When it started running
    pub started_at: Option<DateTime<Utc>>,
    /// When it reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
    /// Incremented on every update
    pub version: u64,
}

impl ExecutionRecord {
    /// Move to `next`, stamping start and completion times
    pub fn transition(&mut self, next: ExecutionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidState(format!(
                "execution {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        let now = Utc::now();
        if next == ExecutionStatus::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        self.status = next;
        Ok(())
    }
}

impl Entity for ExecutionRecord {
    const KIND: &'static str = "execution";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

/// Request to run code
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitExecution {
    /// Language tag (python, javascript, typescript, csharp, bash, rust)
    pub language: String,
    /// Source code
    pub code: String,
    /// Conversation the execution belongs to
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    /// Agent asking for the execution
    #[serde(default)]
    pub requesting_agent_id: Option<Uuid>,
    /// Wall-clock limit in seconds (default from config)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Resource limits
    #[serde(default)]
    pub limits: Option<ResourceLimits>,
}

impl SubmitExecution {
    /// Minimal request
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            conversation_id: None,
            requesting_agent_id: None,
            timeout_seconds: None,
            limits: None,
        }
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Attach to a conversation
    #[must_use]
    pub fn in_conversation(mut self, conversation_id: Uuid) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: ExecutionStatus) -> ExecutionRecord {
        ExecutionRecord {
            id: Uuid::new_v4(),
            language: Language::Python,
            code: "print('x')".into(),
            conversation_id: None,
            requesting_agent_id: None,
            timeout_seconds: 5,
            limits: ResourceLimits::default(),
            status,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            version: 1,
        }
    }

    #[test]
    fn test_transition_table() {
        use ExecutionStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        for terminal in [Completed, Failed, Timeout, Cancelled] {
            assert!(Running.can_transition_to(terminal));
            assert!(terminal.is_terminal());
            for next in ExecutionStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(!Running.can_transition_to(Pending));
    }

    #[test]
    fn test_transition_stamps_times() {
        let mut r = record(ExecutionStatus::Pending);
        r.transition(ExecutionStatus::Running).unwrap();
        assert!(r.started_at.is_some());
        assert!(r.completed_at.is_none());

        r.transition(ExecutionStatus::Completed).unwrap();
        assert!(r.completed_at.is_some());
        assert!(matches!(
            r.transition(ExecutionStatus::Running),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Timeout).unwrap(),
            "\"timeout\""
        );
        for status in ExecutionStatus::ALL {
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.as_str().to_string())
            );
        }
    }
}
