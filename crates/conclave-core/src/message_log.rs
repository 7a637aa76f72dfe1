//! Per-thread message logs
//!
//! A thread is a conversation or a group chat. Each thread owns an
//! append-only list of messages behind its own lock; sequence numbers are
//! assigned under that lock so they start at 1 and never skip or repeat.
//! Appends to different threads never contend.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repository::Page;

/// A delivered message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    /// Message ID
    pub id: Uuid,
    /// Conversation or group chat the message belongs to
    pub thread_id: Uuid,
    /// Sending participant
    pub sender_id: Uuid,
    /// Receiving participants, as computed by routing
    pub recipients: Vec<Uuid>,
    /// Message body
    pub content: String,
    /// Position in the thread, starting at 1
    pub sequence_number: u64,
    /// Append time
    pub created_at: DateTime<Utc>,
}

/// Message before it is appended
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Sending participant
    pub sender_id: Uuid,
    /// Receiving participants
    pub recipients: Vec<Uuid>,
    /// Message body
    pub content: String,
}

type Thread = Arc<Mutex<Vec<Message>>>;

/// Append-only message storage keyed by thread
#[derive(Default)]
pub struct MessageLog {
    threads: DashMap<Uuid, Thread>,
}

impl MessageLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn thread(&self, thread_id: Uuid) -> Thread {
        self.threads.entry(thread_id).or_default().value().clone()
    }

    /// Append a message, assigning the next sequence number
    pub async fn append(&self, thread_id: Uuid, outgoing: OutgoingMessage) -> Message {
        let thread = self.thread(thread_id);
        let mut messages = thread.lock().await;

        let message = Message {
            id: Uuid::new_v4(),
            thread_id,
            sender_id: outgoing.sender_id,
            recipients: outgoing.recipients,
            content: outgoing.content,
            sequence_number: messages.len() as u64 + 1,
            created_at: Utc::now(),
        };
        messages.push(message.clone());

        debug!(
            thread_id = %thread_id,
            sequence = message.sequence_number,
            recipients = message.recipients.len(),
            "Message appended"
        );
        message
    }

    /// Messages in sequence order
    pub async fn list(&self, thread_id: Uuid, page: Page) -> Vec<Message> {
        let Some(thread) = self.threads.get(&thread_id).map(|t| t.value().clone()) else {
            return Vec::new();
        };
        let messages = thread.lock().await;
        page.apply(messages.iter().cloned())
    }

    /// Number of messages in a thread
    pub async fn count(&self, thread_id: Uuid) -> usize {
        let Some(thread) = self.threads.get(&thread_id).map(|t| t.value().clone()) else {
            return 0;
        };
        let messages = thread.lock().await;
        messages.len()
    }

    /// Drop a thread's messages
    pub fn clear(&self, thread_id: Uuid) {
        self.threads.remove(&thread_id);
    }
}
