//! Conversations
//!
//! A conversation is a titled thread between at least two agents. Every
//! message is delivered to all participants except its sender.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::agents::AgentService;
use crate::error::{require_non_empty, Error, Result};
use crate::event_bus::{EventBus, HubEvent};
use crate::message_log::{Message, MessageLog, OutgoingMessage};
use crate::repository::{Entity, Page, PageLimits, PageQuery, Repository};
use crate::routing::{route, RoutingPattern};

/// Fewest participants a thread may have
pub const MIN_PARTICIPANTS: usize = 2;

/// A conversation between agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Conversation {
    /// Conversation ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Ordered participant agent IDs
    pub participant_ids: Vec<Uuid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Incremented on every update
    pub version: u64,
}

impl Entity for Conversation {
    const KIND: &'static str = "conversation";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Request to create a conversation
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateConversation {
    /// Title
    pub title: String,
    /// Participant agent IDs (at least two, distinct)
    pub participant_ids: Vec<Uuid>,
}

/// Request to post a message
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PostMessage {
    /// Sending participant
    pub sender_id: Uuid,
    /// Message body
    pub content: String,
}

/// Check the size and distinctness of a new participant list
pub(crate) fn validate_participants(kind: &str, participant_ids: &[Uuid]) -> Result<()> {
    if participant_ids.len() < MIN_PARTICIPANTS {
        return Err(Error::Validation(format!(
            "{} requires at least {} participants",
            kind, MIN_PARTICIPANTS
        )));
    }
    let mut seen = HashSet::with_capacity(participant_ids.len());
    if let Some(duplicate) = participant_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(Error::Validation(format!(
            "participant {} is listed more than once",
            duplicate
        )));
    }
    Ok(())
}

/// Add `agent_id` to a participant list held under the entity guard
pub(crate) fn push_participant(participants: &mut Vec<Uuid>, agent_id: Uuid) -> Result<()> {
    if participants.contains(&agent_id) {
        return Err(Error::Conflict(format!(
            "agent {} is already a participant",
            agent_id
        )));
    }
    participants.push(agent_id);
    Ok(())
}

/// Remove `agent_id` from a participant list held under the entity guard
pub(crate) fn drop_participant(participants: &mut Vec<Uuid>, agent_id: Uuid) -> Result<()> {
    let index = participants
        .iter()
        .position(|p| *p == agent_id)
        .ok_or_else(|| Error::not_found("participant", agent_id))?;
    if participants.len() <= MIN_PARTICIPANTS {
        return Err(Error::InvalidState(format!(
            "cannot drop below {} participants",
            MIN_PARTICIPANTS
        )));
    }
    participants.remove(index);
    Ok(())
}

/// Conversation operations
pub struct ConversationService {
    repo: Arc<dyn Repository<Conversation>>,
    agents: Arc<AgentService>,
    log: Arc<MessageLog>,
    events: Arc<EventBus>,
    limits: PageLimits,
}

impl ConversationService {
    /// Create the service
    pub fn new(
        repo: Arc<dyn Repository<Conversation>>,
        agents: Arc<AgentService>,
        log: Arc<MessageLog>,
        events: Arc<EventBus>,
        limits: PageLimits,
    ) -> Self {
        Self {
            repo,
            agents,
            log,
            events,
            limits,
        }
    }

    /// Create a conversation between existing agents
    pub async fn create(&self, request: CreateConversation) -> Result<Conversation> {
        require_non_empty("title", &request.title)?;
        validate_participants("conversation", &request.participant_ids)?;
        self.agents.require_all(&request.participant_ids).await?;

        let now = Utc::now();
        let conversation = self
            .repo
            .insert(Conversation {
                id: Uuid::new_v4(),
                title: request.title.trim().to_string(),
                participant_ids: request.participant_ids,
                created_at: now,
                updated_at: now,
                version: 1,
            })
            .await?;

        info!(
            conversation_id = %conversation.id,
            participants = conversation.participant_ids.len(),
            "Conversation created"
        );
        Ok(conversation)
    }

    /// Fetch a conversation
    pub async fn get(&self, id: Uuid) -> Result<Conversation> {
        self.repo.get(id).await
    }

    /// Whether a conversation exists
    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        self.repo.exists(id).await
    }

    /// List conversations by creation time
    pub async fn list(&self, query: PageQuery) -> Result<Vec<Conversation>> {
        self.repo.list(Page::resolve(query, self.limits)).await
    }

    /// Number of conversations
    pub async fn count(&self) -> Result<usize> {
        self.repo.count().await
    }

    /// Delete a conversation and its messages
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.repo.delete(id).await?;
        self.log.clear(id);
        info!(conversation_id = %id, "Conversation deleted");
        Ok(())
    }

    /// Add an existing agent
    pub async fn add_participant(&self, id: Uuid, agent_id: Uuid) -> Result<Conversation> {
        self.agents.ensure_exists(agent_id).await?;
        let conversation = self
            .repo
            .update(
                id,
                Box::new(move |c: &mut Conversation| push_participant(&mut c.participant_ids, agent_id)),
            )
            .await?;
        debug!(conversation_id = %id, agent_id = %agent_id, "Participant added");
        Ok(conversation)
    }

    /// Remove a participant, keeping at least two
    pub async fn remove_participant(&self, id: Uuid, agent_id: Uuid) -> Result<Conversation> {
        let conversation = self
            .repo
            .update(
                id,
                Box::new(move |c: &mut Conversation| drop_participant(&mut c.participant_ids, agent_id)),
            )
            .await?;
        debug!(conversation_id = %id, agent_id = %agent_id, "Participant removed");
        Ok(conversation)
    }

    /// Deliver a message to every other participant
    pub async fn post_message(&self, id: Uuid, request: PostMessage) -> Result<Message> {
        require_non_empty("content", &request.content)?;
        let conversation = self.repo.get(id).await?;
        let recipients = route(
            RoutingPattern::Broadcast,
            &conversation.participant_ids,
            request.sender_id,
        )?;

        let message = self
            .log
            .append(
                id,
                OutgoingMessage {
                    sender_id: request.sender_id,
                    recipients,
                    content: request.content,
                },
            )
            .await;

        // a delete that raced this append has already cleared the thread
        if !self.repo.exists(id).await? {
            self.log.clear(id);
            debug!(conversation_id = %id, "Dropped message posted to a deleted thread");
            return Err(Error::not_found(Conversation::KIND, id));
        }

        self.events.publish(HubEvent::MessageReceived {
            conversation_id: id,
            message: message.clone(),
        });
        Ok(message)
    }

    /// Messages in sequence order
    pub async fn messages(&self, id: Uuid, query: PageQuery) -> Result<Vec<Message>> {
        if !self.repo.exists(id).await? {
            return Err(Error::not_found(Conversation::KIND, id));
        }
        Ok(self.log.list(id, Page::resolve(query, self.limits)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::CreateAgent;
    use crate::repository::testing::VanishingRepository;
    use crate::repository::MemoryRepository;

    struct Fixture {
        service: ConversationService,
        events: Arc<EventBus>,
        agents: Vec<Uuid>,
    }

    async fn fixture(agent_count: usize) -> Fixture {
        fixture_with(agent_count, Arc::new(MemoryRepository::new())).await
    }

    async fn fixture_with(
        agent_count: usize,
        repo: Arc<dyn Repository<Conversation>>,
    ) -> Fixture {
        let events = Arc::new(EventBus::new(16));
        let limits = PageLimits::default();
        let agents = Arc::new(AgentService::new(
            Arc::new(MemoryRepository::new()),
            events.clone(),
            limits,
        ));
        let mut ids = Vec::new();
        for i in 0..agent_count {
            let agent = agents
                .create(CreateAgent::named(format!("agent-{}", i)))
                .await
                .unwrap();
            ids.push(agent.id);
        }
        let service = ConversationService::new(
            repo,
            agents,
            Arc::new(MessageLog::new()),
            events.clone(),
            limits,
        );
        Fixture {
            service,
            events,
            agents: ids,
        }
    }

    fn create(title: &str, participant_ids: &[Uuid]) -> CreateConversation {
        CreateConversation {
            title: title.to_string(),
            participant_ids: participant_ids.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_two_distinct_existing_agents() {
        let f = fixture(2).await;
        let (x, y) = (f.agents[0], f.agents[1]);

        assert!(matches!(
            f.service.create(create("solo", &[x])).await,
            Err(Error::Validation(msg)) if msg.contains("at least 2 participants")
        ));
        assert!(matches!(
            f.service.create(create("dup", &[x, x])).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            f.service.create(create("", &[x, y])).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            f.service.create(create("ghost", &[x, Uuid::new_v4()])).await,
            Err(Error::NotFound { kind: "agent", .. })
        ));

        let conversation = f.service.create(create("pair", &[x, y])).await.unwrap();
        assert_eq!(conversation.participant_ids, vec![x, y]);
    }

    #[tokio::test]
    async fn test_message_goes_to_everyone_else() {
        let f = fixture(3).await;
        let mut rx = f.events.subscribe();
        let conversation = f.service.create(create("trio", &f.agents)).await.unwrap();

        let message = f
            .service
            .post_message(
                conversation.id,
                PostMessage {
                    sender_id: f.agents[1],
                    content: "hi".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(message.sequence_number, 1);
        assert_eq!(message.recipients, vec![f.agents[0], f.agents[2]]);

        match rx.recv().await.unwrap() {
            HubEvent::MessageReceived {
                conversation_id, ..
            } => assert_eq!(conversation_id, conversation.id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_message_from_outsider_is_invalid_state() {
        let f = fixture(2).await;
        let conversation = f.service.create(create("pair", &f.agents)).await.unwrap();
        let result = f
            .service
            .post_message(
                conversation.id,
                PostMessage {
                    sender_id: Uuid::new_v4(),
                    content: "let me in".into(),
                },
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_participant_membership() {
        let f = fixture(3).await;
        let (x, y, z) = (f.agents[0], f.agents[1], f.agents[2]);
        let conversation = f.service.create(create("pair", &[x, y])).await.unwrap();

        let updated = f.service.add_participant(conversation.id, z).await.unwrap();
        assert_eq!(updated.participant_ids, vec![x, y, z]);
        assert_eq!(updated.version, 2);
        assert!(matches!(
            f.service.add_participant(conversation.id, z).await,
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            f.service.add_participant(conversation.id, Uuid::new_v4()).await,
            Err(Error::NotFound { .. })
        ));

        let updated = f.service.remove_participant(conversation.id, x).await.unwrap();
        assert_eq!(updated.participant_ids, vec![y, z]);
        assert!(matches!(
            f.service.remove_participant(conversation.id, y).await,
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            f.service.remove_participant(conversation.id, x).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_clears_messages() {
        let f = fixture(2).await;
        let conversation = f.service.create(create("pair", &f.agents)).await.unwrap();
        f.service
            .post_message(
                conversation.id,
                PostMessage {
                    sender_id: f.agents[0],
                    content: "hello".into(),
                },
            )
            .await
            .unwrap();

        f.service.delete(conversation.id).await.unwrap();
        assert!(matches!(
            f.service.messages(conversation.id, PageQuery::default()).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_post_racing_delete_leaves_no_thread() {
        let repo = Arc::new(VanishingRepository::<Conversation>::new());
        let f = fixture_with(2, repo.clone()).await;
        let conversation = f.service.create(create("doomed", &f.agents)).await.unwrap();

        repo.arm();
        let result = f
            .service
            .post_message(
                conversation.id,
                PostMessage {
                    sender_id: f.agents[0],
                    content: "last words".into(),
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(Error::NotFound { kind: "conversation", .. })
        ));
        assert_eq!(f.service.log.count(conversation.id).await, 0);
    }
}
