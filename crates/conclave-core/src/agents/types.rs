//! Agent types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{require_non_empty, Error, Result};
use crate::repository::Entity;

/// Longest accepted agent name
pub const MAX_NAME_LEN: usize = 100;

/// Model used when none is given
pub const DEFAULT_MODEL: &str = "gpt-4";

/// What part an agent plays in a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// General-purpose assistant
    #[default]
    Assistant,
    /// Acts on behalf of a human
    UserProxy,
    /// Delegates work in supervised runs
    Supervisor,
    /// Domain specialist
    Specialist,
}

/// Availability of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Ready for work
    #[default]
    Idle,
    /// Currently working
    Busy,
    /// Not reachable
    Offline,
    /// Last operation failed
    Error,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
            AgentStatus::Offline => "offline",
            AgentStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A participant that can be added to conversations and group chats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Agent {
    /// Agent ID
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// Short description
    pub description: String,
    /// System prompt
    pub system_message: String,
    /// Team role
    pub role: AgentRole,
    /// Current status
    pub status: AgentStatus,
    /// Model name
    pub model: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Incremented on every update
    pub version: u64,
}

impl Entity for Agent {
    const KIND: &'static str = "agent";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Request to create an agent
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateAgent {
    /// Unique display name
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// System prompt
    #[serde(default)]
    pub system_message: Option<String>,
    /// Team role (default: assistant)
    #[serde(default)]
    pub role: Option<AgentRole>,
    /// Model name (default: gpt-4)
    #[serde(default)]
    pub model: Option<String>,
    /// Sampling temperature (default: 0.7)
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl CreateAgent {
    /// Request with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the role
    #[must_use]
    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the system message
    #[must_use]
    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = Some(system_message.into());
        self
    }

    /// Validate and build the stored agent
    pub fn into_agent(self) -> Result<Agent> {
        validate_name(&self.name)?;
        let temperature = self.temperature.unwrap_or(0.7);
        validate_temperature(temperature)?;

        let system_message = self.system_message.unwrap_or_default();
        let description = self.description.unwrap_or_else(|| {
            system_message.lines().next().unwrap_or_default().to_string()
        });
        let now = Utc::now();

        Ok(Agent {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            description,
            system_message,
            role: self.role.unwrap_or_default(),
            status: AgentStatus::Idle,
            model: self
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }
}

/// Partial update of an agent; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAgent {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New system prompt
    #[serde(default)]
    pub system_message: Option<String>,
    /// New role
    #[serde(default)]
    pub role: Option<AgentRole>,
    /// New model
    #[serde(default)]
    pub model: Option<String>,
    /// New temperature
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl UpdateAgent {
    /// Apply to a stored agent
    pub fn apply(self, agent: &mut Agent) -> Result<()> {
        if let Some(name) = self.name {
            validate_name(&name)?;
            agent.name = name.trim().to_string();
        }
        if let Some(temperature) = self.temperature {
            validate_temperature(temperature)?;
            agent.temperature = temperature;
        }
        if let Some(model) = self.model {
            require_non_empty("model", &model)?;
            agent.model = model;
        }
        if let Some(description) = self.description {
            agent.description = description;
        }
        if let Some(system_message) = self.system_message {
            agent.system_message = system_message;
        }
        if let Some(role) = self.role {
            agent.role = role;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    require_non_empty("name", name)?;
    if name.trim().chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_temperature(temperature: f32) -> Result<()> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(Error::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            temperature
        )));
    }
    Ok(())
}
