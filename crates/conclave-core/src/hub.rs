//! Service wiring
//!
//! [`Hub`] builds every service over in-memory repositories and one shared
//! event bus. The HTTP layer holds a single `Arc<Hub>`.

use conclave_sandbox::{CodeExecutor, MockExecutor, MockExecutorConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::agents::AgentService;
use crate::conversations::ConversationService;
use crate::error::Result;
use crate::event_bus::EventBus;
use crate::execution::{ExecutionConfig, ExecutionService, ExecutionStatus};
use crate::group_chats::GroupChatService;
use crate::message_log::MessageLog;
use crate::orchestration::{MockTeamRunner, OrchestrationConfig, OrchestrationService, TeamRunner};
use crate::orders::OrderService;
use crate::repository::{MemoryRepository, PageLimits};

/// Settings for every service in the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Pagination limits shared by all list operations
    pub limits: PageLimits,
    /// Execution pipeline settings
    pub execution: ExecutionConfig,
    /// Simulated run time of the mock executor
    pub mock_execution_delay: Duration,
    /// Team run settings
    pub orchestration: OrchestrationConfig,
    /// Events buffered per subscriber before it lags
    pub event_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            limits: PageLimits::default(),
            execution: ExecutionConfig::default(),
            mock_execution_delay: Duration::from_millis(100),
            orchestration: OrchestrationConfig::default(),
            event_capacity: 256,
        }
    }
}

/// Entity and queue counts for health reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStats {
    /// Registered agents
    pub agents: usize,
    /// Open conversations
    pub conversations: usize,
    /// Group chats
    pub group_chats: usize,
    /// Execution records by status
    pub executions: BTreeMap<ExecutionStatus, usize>,
    /// Ids waiting for a worker
    pub queue_depth: usize,
    /// Live event subscribers
    pub event_subscribers: usize,
}

/// All services, sharing one event bus and one message log
pub struct Hub {
    /// Agent registry
    pub agents: Arc<AgentService>,
    /// Conversations
    pub conversations: Arc<ConversationService>,
    /// Group chats
    pub group_chats: Arc<GroupChatService>,
    /// Team runs
    pub teams: Arc<OrchestrationService>,
    /// Code execution pipeline
    pub executions: Arc<ExecutionService>,
    /// Order coordination
    pub orders: Arc<OrderService>,
    /// Event bus feeding WebSocket clients
    pub events: Arc<EventBus>,
}

impl Hub {
    /// Hub with the mock executor and the mock team runner
    pub fn new(config: HubConfig) -> Self {
        let executor = Arc::new(MockExecutor::new(
            MockExecutorConfig::default().with_delay(config.mock_execution_delay),
        ));
        let runner = Arc::new(MockTeamRunner::new(config.orchestration.turn_delay));
        Self::with_backends(config, executor, runner)
    }

    /// Hub with custom execution and orchestration backends
    pub fn with_backends(
        config: HubConfig,
        executor: Arc<dyn CodeExecutor>,
        runner: Arc<dyn TeamRunner>,
    ) -> Self {
        let events = Arc::new(EventBus::new(config.event_capacity));
        let log = Arc::new(MessageLog::new());

        let agents = Arc::new(AgentService::new(
            Arc::new(MemoryRepository::new()),
            events.clone(),
            config.limits,
        ));
        let conversations = Arc::new(ConversationService::new(
            Arc::new(MemoryRepository::new()),
            agents.clone(),
            log.clone(),
            events.clone(),
            config.limits,
        ));
        let teams = Arc::new(OrchestrationService::new(runner, config.orchestration));
        let group_chats = Arc::new(GroupChatService::new(
            Arc::new(MemoryRepository::new()),
            agents.clone(),
            log,
            teams.clone(),
            events.clone(),
            config.limits,
        ));
        let executions = Arc::new(ExecutionService::new(
            Arc::new(MemoryRepository::new()),
            agents.clone(),
            conversations.clone(),
            executor,
            events.clone(),
            config.execution,
            config.limits,
        ));
        let orders = Arc::new(OrderService::new(teams.clone()));

        info!(
            workers = config.execution.max_concurrent,
            event_capacity = config.event_capacity,
            "Hub initialized"
        );

        Self {
            agents,
            conversations,
            group_chats,
            teams,
            executions,
            orders,
            events,
        }
    }

    /// Current counts
    pub async fn stats(&self) -> Result<HubStats> {
        Ok(HubStats {
            agents: self.agents.count().await?,
            conversations: self.conversations.count().await?,
            group_chats: self.group_chats.count().await?,
            executions: self.executions.count_by_status().await?,
            queue_depth: self.executions.queue_depth(),
            event_subscribers: self.events.subscriber_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::CreateAgent;
    use crate::conversations::{CreateConversation, PostMessage};
    use crate::event_bus::HubEvent;

    #[tokio::test]
    async fn test_services_share_event_bus() {
        let hub = Hub::new(HubConfig::default());
        let mut rx = hub.events.subscribe();

        let a = hub.agents.create(CreateAgent::named("alpha")).await.unwrap();
        let b = hub.agents.create(CreateAgent::named("beta")).await.unwrap();
        let conversation = hub
            .conversations
            .create(CreateConversation {
                title: "sync".into(),
                participant_ids: vec![a.id, b.id],
            })
            .await
            .unwrap();
        hub.conversations
            .post_message(
                conversation.id,
                PostMessage {
                    sender_id: a.id,
                    content: "hello".into(),
                },
            )
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            HubEvent::MessageReceived { message, .. } => {
                assert_eq!(message.recipients, vec![b.id]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stats() {
        let hub = Hub::new(HubConfig::default());
        assert_eq!(hub.agents.seed_defaults().await.unwrap(), 4);
        let _rx = hub.events.subscribe();

        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.agents, 4);
        assert_eq!(stats.conversations, 0);
        assert_eq!(stats.group_chats, 0);
        assert_eq!(stats.executions.len(), ExecutionStatus::ALL.len());
        assert_eq!(stats.queue_depth, 0);
        assert_eq!(stats.event_subscribers, 1);
    }
}
