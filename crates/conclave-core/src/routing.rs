//! Group-chat message routing
//!
//! Given the ordered participant list of a thread, the sender and the
//! configured [`RoutingPattern`], [`route`] computes who receives a message.
//! The function is pure: identical inputs always yield identical outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// How messages in a group are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPattern {
    /// Next participant after the sender, wrapping around
    #[default]
    RoundRobin,
    /// Everyone except the sender
    Broadcast,
    /// A supervisor delegates; messages are delivered like broadcast
    Supervised,
    /// Explicitly routed like broadcast
    Router,
    /// Everyone except the sender
    FreeForAll,
    /// Delegates to round robin
    SpeakerSelection,
}

impl RoutingPattern {
    /// All patterns
    pub const ALL: [RoutingPattern; 6] = [
        RoutingPattern::RoundRobin,
        RoutingPattern::Broadcast,
        RoutingPattern::Supervised,
        RoutingPattern::Router,
        RoutingPattern::FreeForAll,
        RoutingPattern::SpeakerSelection,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingPattern::RoundRobin => "round_robin",
            RoutingPattern::Broadcast => "broadcast",
            RoutingPattern::Supervised => "supervised",
            RoutingPattern::Router => "router",
            RoutingPattern::FreeForAll => "free_for_all",
            RoutingPattern::SpeakerSelection => "speaker_selection",
        }
    }
}

impl fmt::Display for RoutingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingPattern {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "round_robin" | "roundrobin" => Ok(RoutingPattern::RoundRobin),
            "broadcast" => Ok(RoutingPattern::Broadcast),
            "supervised" => Ok(RoutingPattern::Supervised),
            "router" => Ok(RoutingPattern::Router),
            "free_for_all" | "freeforall" => Ok(RoutingPattern::FreeForAll),
            "speaker_selection" | "speakerselection" => Ok(RoutingPattern::SpeakerSelection),
            _ => Err(crate::Error::Validation(format!(
                "unknown routing pattern: {}",
                s
            ))),
        }
    }
}

/// Routing failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The sender is not in the participant list
    #[error("sender {0} is not a participant")]
    NotAParticipant(Uuid),

    /// Routing produced an empty recipient set
    #[error("no recipients for message from {0}")]
    NoRecipients(Uuid),
}

/// Compute the recipients of one message.
///
/// Recipients are returned in registry order and never include the sender
/// for the broadcast family. For round robin the first occurrence of the
/// sender is used.
pub fn route(
    pattern: RoutingPattern,
    participants: &[Uuid],
    sender: Uuid,
) -> Result<Vec<Uuid>, RoutingError> {
    let index = participants
        .iter()
        .position(|p| *p == sender)
        .ok_or(RoutingError::NotAParticipant(sender))?;

    let recipients = match pattern {
        RoutingPattern::RoundRobin | RoutingPattern::SpeakerSelection => {
            vec![participants[(index + 1) % participants.len()]]
        }
        RoutingPattern::Broadcast
        | RoutingPattern::FreeForAll
        | RoutingPattern::Supervised
        | RoutingPattern::Router => participants
            .iter()
            .copied()
            .filter(|p| *p != sender)
            .collect(),
    };

    // A single-member list routes round robin back to the sender.
    if recipients.is_empty() || recipients == [sender] {
        return Err(RoutingError::NoRecipients(sender));
    }
    Ok(recipients)
}
