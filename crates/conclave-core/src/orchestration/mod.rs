//! Team orchestration
//!
//! Runs a list of members against a task and records a transcript. The
//! shipped [`MockTeamRunner`] produces scripted lines; a real backend plugs
//! in through [`TeamRunner`].
//!
//! Every run is bounded by [`OrchestrationConfig::run_timeout`]. A run that
//! overruns is reported as [`RunStatus::TimedOut`] with the lines written
//! before the deadline.

mod runner;
mod types;


pub use runner::{MockTeamRunner, TeamRunner};
pub use types::{
    OrchestrationConfig, RunStatus, TeamMember, TeamRunRequest, TeamRunResult, Transcript,
    TranscriptEntry,
};

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{require_non_empty, Error, Result};

/// Validates and times team runs
pub struct OrchestrationService {
    runner: Arc<dyn TeamRunner>,
    config: OrchestrationConfig,
}

impl OrchestrationService {
    /// Create the service
    pub fn new(runner: Arc<dyn TeamRunner>, config: OrchestrationConfig) -> Self {
        Self { runner, config }
    }

    /// Run an ad hoc team
    pub async fn run(&self, request: TeamRunRequest) -> Result<TeamRunResult> {
        self.run_for(None, request).await
    }

    /// Run a team, tagging the result with the group chat it belongs to
    pub async fn run_for(
        &self,
        group_chat_id: Option<Uuid>,
        request: TeamRunRequest,
    ) -> Result<TeamRunResult> {
        if request.participants.is_empty() {
            return Err(Error::Validation(
                "team run requires at least one participant".to_string(),
            ));
        }
        require_non_empty("task", &request.task)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            runner = self.runner.name(),
            pattern = %request.pattern,
            participants = request.participants.len(),
            "Team run started"
        );

        let mut transcript = Transcript::default();
        let outcome = tokio::time::timeout(
            self.config.run_timeout,
            self.runner.run(
                request.pattern,
                &request.participants,
                &request.task,
                &mut transcript,
            ),
        )
        .await;

        let (status, error) = match outcome {
            Ok(Ok(())) => (RunStatus::Completed, None),
            Ok(Err(e)) => {
                warn!(run_id = %run_id, error = %e, "Team run failed");
                (RunStatus::Failed, Some(e.to_string()))
            }
            Err(_) => {
                warn!(
                    run_id = %run_id,
                    timeout_ms = self.config.run_timeout.as_millis() as u64,
                    lines = transcript.len(),
                    "Team run timed out"
                );
                (RunStatus::TimedOut, None)
            }
        };

        info!(run_id = %run_id, status = ?status, lines = transcript.len(), "Team run finished");
        Ok(TeamRunResult {
            run_id,
            group_chat_id,
            pattern: request.pattern,
            task: request.task,
            status,
            transcript: transcript.into_entries(),
            error,
            started_at,
            completed_at: Utc::now(),
        })
    }
}
