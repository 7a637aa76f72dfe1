//! Group chats
//!
//! A group chat keeps an ordered participant list and a routing pattern.
//! Posting a message routes it with [`crate::routing::route`] and appends it
//! to the group's message log. Running a group chat hands its members to the
//! orchestration service.

mod types;


pub use types::{CreateGroupChat, GroupChat, RunGroupChat, UpdateGroupChat};

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::agents::AgentService;
use crate::conversations::{drop_participant, push_participant, validate_participants, PostMessage};
use crate::error::{require_non_empty, Error, Result};
use crate::event_bus::{EventBus, HubEvent};
use crate::message_log::{Message, MessageLog, OutgoingMessage};
use crate::orchestration::{OrchestrationService, TeamMember, TeamRunRequest, TeamRunResult};
use crate::repository::{Entity, Page, PageLimits, PageQuery, Repository};
use crate::routing::route;

/// Group chat operations
pub struct GroupChatService {
    repo: Arc<dyn Repository<GroupChat>>,
    agents: Arc<AgentService>,
    log: Arc<MessageLog>,
    teams: Arc<OrchestrationService>,
    events: Arc<EventBus>,
    limits: PageLimits,
}

impl GroupChatService {
    /// Create the service
    pub fn new(
        repo: Arc<dyn Repository<GroupChat>>,
        agents: Arc<AgentService>,
        log: Arc<MessageLog>,
        teams: Arc<OrchestrationService>,
        events: Arc<EventBus>,
        limits: PageLimits,
    ) -> Self {
        Self {
            repo,
            agents,
            log,
            teams,
            events,
            limits,
        }
    }

    /// Create a group chat
    pub async fn create(&self, request: CreateGroupChat) -> Result<GroupChat> {
        require_non_empty("name", &request.name)?;
        validate_participants("group chat", &request.participant_ids)?;
        self.agents.require_all(&request.participant_ids).await?;

        let now = Utc::now();
        let group = self
            .repo
            .insert(GroupChat {
                id: Uuid::new_v4(),
                name: request.name.trim().to_string(),
                description: request.description,
                participant_ids: request.participant_ids,
                pattern: request.pattern,
                created_at: now,
                updated_at: now,
                version: 1,
            })
            .await?;

        info!(
            group_chat_id = %group.id,
            name = %group.name,
            pattern = %group.pattern,
            participants = group.participant_ids.len(),
            "Group chat created"
        );
        Ok(group)
    }

    /// Fetch a group chat
    pub async fn get(&self, id: Uuid) -> Result<GroupChat> {
        self.repo.get(id).await
    }

    /// List group chats by creation time
    pub async fn list(&self, query: PageQuery) -> Result<Vec<GroupChat>> {
        self.repo.list(Page::resolve(query, self.limits)).await
    }

    /// Number of group chats
    pub async fn count(&self) -> Result<usize> {
        self.repo.count().await
    }

    /// Rename, redescribe or change the pattern
    pub async fn update(&self, id: Uuid, request: UpdateGroupChat) -> Result<GroupChat> {
        let group = self
            .repo
            .update(id, Box::new(move |g: &mut GroupChat| request.apply(g)))
            .await?;
        debug!(group_chat_id = %id, version = group.version, "Group chat updated");
        Ok(group)
    }

    /// Delete a group chat and its messages
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.repo.delete(id).await?;
        self.log.clear(id);
        info!(group_chat_id = %id, "Group chat deleted");
        Ok(())
    }

    /// Append an existing agent to the participant order
    pub async fn add_participant(&self, id: Uuid, agent_id: Uuid) -> Result<GroupChat> {
        self.agents.ensure_exists(agent_id).await?;
        self.repo
            .update(
                id,
                Box::new(move |g: &mut GroupChat| push_participant(&mut g.participant_ids, agent_id)),
            )
            .await
    }

    /// Remove a participant, keeping at least two
    pub async fn remove_participant(&self, id: Uuid, agent_id: Uuid) -> Result<GroupChat> {
        self.repo
            .update(
                id,
                Box::new(move |g: &mut GroupChat| drop_participant(&mut g.participant_ids, agent_id)),
            )
            .await
    }

    /// Route and store a message
    pub async fn post_message(&self, id: Uuid, request: PostMessage) -> Result<Message> {
        require_non_empty("content", &request.content)?;
        let group = self.repo.get(id).await?;
        let recipients = route(group.pattern, &group.participant_ids, request.sender_id)?;

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
            debug!(group_chat_id = %id, "Dropped message posted to a deleted thread");
            return Err(Error::not_found(GroupChat::KIND, id));
        }

        debug!(
            group_chat_id = %id,
            pattern = %group.pattern,
            sequence = message.sequence_number,
            "Group message routed"
        );
        self.events.publish(HubEvent::GroupMessageReceived {
            group_chat_id: id,
            message: message.clone(),
        });
        Ok(message)
    }

    /// Messages in sequence order
    pub async fn messages(&self, id: Uuid, query: PageQuery) -> Result<Vec<Message>> {
        if !self.repo.exists(id).await? {
            return Err(Error::not_found(GroupChat::KIND, id));
        }
        Ok(self.log.list(id, Page::resolve(query, self.limits)).await)
    }

    /// Run the group's members against a task with the group's pattern
    pub async fn run(&self, id: Uuid, task: String) -> Result<TeamRunResult> {
        let group = self.repo.get(id).await?;
        let members = self
            .agents
            .require_all(&group.participant_ids)
            .await?
            .into_iter()
            .map(|agent| TeamMember::new(agent.name, agent.role))
            .collect();

        self.teams
            .run_for(
                Some(id),
                TeamRunRequest {
                    pattern: group.pattern,
                    participants: members,
                    task,
                },
            )
            .await
    }
}
