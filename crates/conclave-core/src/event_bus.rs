//! EventBus - broadcast-based event system for real-time hub events.
//!
//! Services publish here after a state change is stored; the WebSocket layer
//! subscribes and fans events out to clients joined to the matching topic.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::agents::AgentStatus;
use crate::execution::ExecutionStatus;
use crate::message_log::Message;

/// A subscription topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Topic {
    /// Messages of one conversation
    Conversation(Uuid),
    /// Messages of one group chat
    GroupChat(Uuid),
}

/// Events emitted by the hub services.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    /// A message was appended to a conversation
    MessageReceived {
        /// Conversation ID
        conversation_id: Uuid,
        /// Stored message
        message: Message,
    },
    /// A message was appended to a group chat
    GroupMessageReceived {
        /// Group chat ID
        group_chat_id: Uuid,
        /// Stored message
        message: Message,
    },
    /// An agent's status changed
    AgentStatusChanged {
        /// Agent ID
        agent_id: Uuid,
        /// Status before the change
        previous: AgentStatus,
        /// Status after the change
        status: AgentStatus,
    },
    /// An execution reached a terminal state
    ExecutionCompleted {
        /// Execution ID
        execution_id: Uuid,
        /// Conversation the execution belongs to, if any
        conversation_id: Option<Uuid>,
        /// Terminal status
        status: ExecutionStatus,
    },
}

impl HubEvent {
    /// Topic the event is scoped to; `None` means every client receives it.
    #[must_use]
    pub fn topic(&self) -> Option<Topic> {
        match self {
            Self::MessageReceived {
                conversation_id, ..
            } => Some(Topic::Conversation(*conversation_id)),
            Self::GroupMessageReceived { group_chat_id, .. } => {
                Some(Topic::GroupChat(*group_chat_id))
            }
            Self::AgentStatusChanged { .. } => None,
            Self::ExecutionCompleted {
                conversation_id, ..
            } => conversation_id.map(Topic::Conversation),
        }
    }

    /// Event type name as serialized in the `type` tag
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageReceived { .. } => "message_received",
            Self::GroupMessageReceived { .. } => "group_message_received",
            Self::AgentStatusChanged { .. } => "agent_status_changed",
            Self::ExecutionCompleted { .. } => "execution_completed",
        }
    }
}

/// Broadcast-based event bus.
///
/// Slow subscribers miss events (lagged) rather than blocking the publisher.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HubEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns the number of subscribers reached.
    pub fn publish(&self, event: HubEvent) -> usize {
        // send() returns Err if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Current number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
