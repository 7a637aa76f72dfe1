use conclave_core::{HubEvent, Topic};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Request from client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriptionRequest {
    /// Start receiving events for a thread
    Join { topic: Topic },
    /// Stop receiving events for a thread
    Leave { topic: Topic },
    /// Ping for keepalive
    Ping,
}

/// Control frame sent to the client
///
/// Hub events themselves are forwarded as serialized [`HubEvent`]s.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventNotification {
    /// Connection established
    Connected { session_id: Uuid },
    /// Current topic set after a join or leave
    Subscribed { topics: Vec<Topic> },
    /// Pong response
    Pong,
    /// Error notification
    Error {
        message: String,
        code: Option<String>,
    },
}

/// Topics one client has joined
#[derive(Debug, Default)]
pub struct SubscriptionState {
    pub topics: HashSet<Topic>,
}

impl SubscriptionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, topic: Topic) {
        self.topics.insert(topic);
    }

    pub fn leave(&mut self, topic: &Topic) {
        self.topics.remove(topic);
    }

    /// Snapshot of the joined topics
    pub fn topics(&self) -> Vec<Topic> {
        self.topics.iter().copied().collect()
    }

    /// Whether `event` should be pushed to this client.
    ///
    /// Unscoped events go to every client; scoped ones only to clients
    /// that joined the topic.
    pub fn wants(&self, event: &HubEvent) -> bool {
        match event.topic() {
            None => true,
            Some(topic) => self.topics.contains(&topic),
        }
    }
}
