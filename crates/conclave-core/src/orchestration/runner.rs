use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::types::{TeamMember, Transcript};
use crate::agents::AgentRole;
use crate::error::Result;
use crate::routing::RoutingPattern;

/// Backend that carries out a team run
#[async_trait]
pub trait TeamRunner: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Run `members` against `task`, appending each turn to `transcript`.
    ///
    /// The caller may drop the future at any point; lines already pushed
    /// are kept.
    async fn run(
        &self,
        pattern: RoutingPattern,
        members: &[TeamMember],
        task: &str,
        transcript: &mut Transcript,
    ) -> Result<()>;
}

/// Scripted runner: one fixed line per member, no inference
#[derive(Debug, Clone, Default)]
pub struct MockTeamRunner {
    turn_delay: Duration,
}

impl MockTeamRunner {
    /// Create a runner that pauses `turn_delay` before each line
    #[must_use]
    pub fn new(turn_delay: Duration) -> Self {
        Self { turn_delay }
    }

    /// The lines a run produces, as `(member, content)`
    pub fn script(pattern: RoutingPattern, members: &[TeamMember], task: &str) -> Vec<(String, String)> {
        match pattern {
            RoutingPattern::Broadcast => members
                .iter()
                .map(|m| {
                    (
                        m.name.clone(),
                        format!("{} responding to broadcast: {}", m.name, task),
                    )
                })
                .collect(),
            RoutingPattern::Supervised => {
                let supervisor = members
                    .iter()
                    .position(|m| m.role == AgentRole::Supervisor)
                    .unwrap_or(0);
                let mut lines = Vec::with_capacity(members.len());
                if let Some(lead) = members.get(supervisor) {
                    lines.push((
                        lead.name.clone(),
                        format!("{} delegating task: {}", lead.name, task),
                    ));
                }
                lines.extend(
                    members
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != supervisor)
                        .map(|(_, m)| {
                            (
                                m.name.clone(),
                                format!("{} working on delegated task: {}", m.name, task),
                            )
                        }),
                );
                lines
            }
            RoutingPattern::RoundRobin
            | RoutingPattern::Router
            | RoutingPattern::FreeForAll
            | RoutingPattern::SpeakerSelection => members
                .iter()
                .map(|m| {
                    (
                        m.name.clone(),
                        format!("{} processing task: {}", m.name, task),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl TeamRunner for MockTeamRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(
        &self,
        pattern: RoutingPattern,
        members: &[TeamMember],
        task: &str,
        transcript: &mut Transcript,
    ) -> Result<()> {
        for (participant, content) in Self::script(pattern, members, task) {
            if !self.turn_delay.is_zero() {
                tokio::time::sleep(self.turn_delay).await;
            }
            debug!(participant = %participant, "Mock turn");
            transcript.push(participant, content);
        }
        Ok(())
    }
}
