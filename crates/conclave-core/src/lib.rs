//! Conclave Core - agents, threads and execution pipeline
//!
//! This crate holds the domain logic of the Conclave service:
//! - Agents: the participant registry, seeded with a default roster
//! - Conversations and group chats, each with an append-only message log
//! - Routing: which participants receive a group message
//! - Orchestration: scripted team runs behind the `TeamRunner` trait
//! - Execution: queued code runs on a `CodeExecutor` backend
//! - Orders: supply-chain order coordination on top of a team run

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod conversations;
pub mod error;
pub mod event_bus;
pub mod execution;
pub mod group_chats;
pub mod hub;
pub mod message_log;
pub mod orchestration;
pub mod orders;
pub mod repository;
pub mod routing;
pub mod shutdown;

pub use agents::{Agent, AgentRole, AgentService, AgentStatus, CreateAgent, UpdateAgent};
pub use conversations::{Conversation, ConversationService, CreateConversation, PostMessage};
pub use error::{Error, Result};
pub use event_bus::{EventBus, HubEvent, Topic};
pub use execution::{
    ExecutionConfig, ExecutionRecord, ExecutionService, ExecutionStatus, RecoveryReport,
    SubmitExecution,
};
pub use group_chats::{
    CreateGroupChat, GroupChat, GroupChatService, RunGroupChat, UpdateGroupChat,
};
pub use hub::{Hub, HubConfig, HubStats};
pub use message_log::{Message, MessageLog};
pub use orchestration::{
    MockTeamRunner, OrchestrationConfig, OrchestrationService, RunStatus, TeamMember,
    TeamRunRequest, TeamRunResult, TeamRunner, TranscriptEntry,
};
pub use orders::{OrderRequest, OrderResult, OrderService, OrderStatus};
pub use repository::{MemoryRepository, PageLimits, PageQuery, Repository};
pub use routing::{route, RoutingError, RoutingPattern};
pub use shutdown::{wait_for_shutdown_signal, ShutdownController, ShutdownPhase};
