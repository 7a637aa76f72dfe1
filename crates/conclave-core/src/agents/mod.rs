//! Agents
//!
//! Agents are the participants of conversations and group chats. Deleting
//! an agent does not cascade into the threads that reference it.

mod defaults;
mod types;


pub use defaults::{default_agents, ROSTER};
pub use types::{
    Agent, AgentRole, AgentStatus, CreateAgent, UpdateAgent, DEFAULT_MODEL, MAX_NAME_LEN,
};

use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::event_bus::{EventBus, HubEvent};
use crate::repository::{Entity, Page, PageLimits, PageQuery, Repository};

/// Agent registry operations
pub struct AgentService {
    repo: Arc<dyn Repository<Agent>>,
    events: Arc<EventBus>,
    limits: PageLimits,
}

impl AgentService {
    /// Create a service over the given repository
    pub fn new(repo: Arc<dyn Repository<Agent>>, events: Arc<EventBus>, limits: PageLimits) -> Self {
        Self {
            repo,
            events,
            limits,
        }
    }

    /// Create an agent
    pub async fn create(&self, request: CreateAgent) -> Result<Agent> {
        let agent = self.repo.insert(request.into_agent()?).await?;
        info!(agent_id = %agent.id, name = %agent.name, role = ?agent.role, "Agent created");
        Ok(agent)
    }

    /// Fetch an agent
    pub async fn get(&self, id: Uuid) -> Result<Agent> {
        self.repo.get(id).await
    }

    /// List agents by creation time
    pub async fn list(&self, query: PageQuery) -> Result<Vec<Agent>> {
        self.repo.list(Page::resolve(query, self.limits)).await
    }

    /// Number of agents
    pub async fn count(&self) -> Result<usize> {
        self.repo.count().await
    }

    /// Apply a partial update
    pub async fn update(&self, id: Uuid, request: UpdateAgent) -> Result<Agent> {
        let agent = self
            .repo
            .update(id, Box::new(move |agent: &mut Agent| request.apply(agent)))
            .await?;
        debug!(agent_id = %id, version = agent.version, "Agent updated");
        Ok(agent)
    }

    /// Delete an agent
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let agent = self.repo.delete(id).await?;
        info!(agent_id = %id, name = %agent.name, "Agent deleted");
        Ok(())
    }

    /// Change an agent's status and announce it when it actually changed.
    /// Setting the current status again leaves the record (and its version)
    /// untouched.
    pub async fn set_status(&self, id: Uuid, status: AgentStatus) -> Result<Agent> {
        let current = self.get(id).await?;
        if current.status == status {
            debug!(agent_id = %id, %status, "Agent status unchanged");
            return Ok(current);
        }

        let previous = Arc::new(Mutex::new(None));
        let captured = previous.clone();
        let agent = self
            .repo
            .update(
                id,
                Box::new(move |agent: &mut Agent| {
                    if let Ok(mut slot) = captured.lock() {
                        *slot = Some(agent.status);
                    }
                    agent.status = status;
                    Ok(())
                }),
            )
            .await?;

        let previous = previous.lock().ok().and_then(|slot| *slot).unwrap_or(status);
        if previous != status {
            info!(agent_id = %id, %previous, %status, "Agent status changed");
            self.events.publish(HubEvent::AgentStatusChanged {
                agent_id: id,
                previous,
                status,
            });
        }
        Ok(agent)
    }

    /// Resolve every id to an agent, failing on the first unknown one
    pub async fn require_all(&self, ids: &[Uuid]) -> Result<Vec<Agent>> {
        let mut agents = Vec::with_capacity(ids.len());
        for id in ids {
            agents.push(self.repo.get(*id).await?);
        }
        Ok(agents)
    }

    /// Fail with `NotFound` unless the agent exists
    pub async fn ensure_exists(&self, id: Uuid) -> Result<()> {
        if self.repo.exists(id).await? {
            Ok(())
        } else {
            Err(Error::not_found(Agent::KIND, id))
        }
    }

    /// Create the default roster, skipping names that already exist
    pub async fn seed_defaults(&self) -> Result<usize> {
        let mut created = 0;
        for request in default_agents() {
            let name = request.name.clone();
            match self.create(request).await {
                Ok(_) => created += 1,
                Err(Error::Conflict(_)) => debug!(name = %name, "Default agent already present"),
                Err(e) => return Err(e),
            }
        }
        info!(created, "Default agents seeded");
        Ok(created)
    }
}
