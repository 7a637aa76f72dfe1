use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::agents::AgentRole;
use crate::routing::RoutingPattern;

/// Default pause between two mock turns
pub(crate) const DEFAULT_TURN_DELAY: Duration = Duration::from_millis(0);

/// Default upper bound on one team run
pub(crate) const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestration settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestrationConfig {
    /// Pause the mock runner takes per turn
    pub turn_delay: Duration,
    /// Runs exceeding this are reported as timed out
    pub run_timeout: Duration,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            turn_delay: DEFAULT_TURN_DELAY,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }
}

/// One member of a team run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TeamMember {
    /// Display name used in the transcript
    pub name: String,
    /// Role; decides the supervisor in supervised runs
    #[serde(default)]
    pub role: AgentRole,
}

impl TeamMember {
    /// Create a member
    pub fn new(name: impl Into<String>, role: AgentRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Ad hoc team run request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamRunRequest {
    /// How the team coordinates
    #[serde(default)]
    pub pattern: RoutingPattern,
    /// Ordered team members
    pub participants: Vec<TeamMember>,
    /// Task given to the team
    pub task: String,
}

/// One line of a run transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TranscriptEntry {
    /// Member that produced the line
    pub participant: String,
    /// Line content
    pub content: String,
    /// When the line was produced
    pub timestamp: DateTime<Utc>,
}

/// Transcript buffer a runner appends to.
///
/// Entries written before a timeout stay readable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Append a line stamped with the current time
    pub fn push(&mut self, participant: impl Into<String>, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            participant: participant.into(),
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    /// Lines written so far
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was written
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the lines
    pub fn into_entries(self) -> Vec<TranscriptEntry> {
        self.entries
    }
}

/// Outcome of a team run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every turn ran
    Completed,
    /// The runner reported an error
    Failed,
    /// The run exceeded its timeout
    TimedOut,
}

/// Result of a team run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamRunResult {
    /// Run ID
    pub run_id: Uuid,
    /// Group chat the run was started for, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_chat_id: Option<Uuid>,
    /// Pattern used
    pub pattern: RoutingPattern,
    /// Task given to the team
    pub task: String,
    /// Outcome
    pub status: RunStatus,
    /// Ordered transcript (partial when timed out)
    pub transcript: Vec<TranscriptEntry>,
    /// Runner error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub completed_at: DateTime<Utc>,
}
