use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{require_non_empty, Result};
use crate::repository::Entity;
use crate::routing::RoutingPattern;

/// A named group of agents with a routing pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GroupChat {
    /// Group chat ID
    pub id: Uuid,
    /// Unique name
    pub name: String,
    /// Description
    pub description: String,
    /// Ordered participant agent IDs; order drives round robin
    pub participant_ids: Vec<Uuid>,
    /// How messages are delivered
    pub pattern: RoutingPattern,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Incremented on every update
    pub version: u64,
}

impl Entity for GroupChat {
    const KIND: &'static str = "group chat";

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

/// Request to create a group chat
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateGroupChat {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Ordered participant agent IDs (at least two, distinct)
    pub participant_ids: Vec<Uuid>,
    /// Routing pattern (default: round_robin)
    #[serde(default)]
    pub pattern: RoutingPattern,
}

/// Partial update of a group chat
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateGroupChat {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New routing pattern
    #[serde(default)]
    pub pattern: Option<RoutingPattern>,
}

impl UpdateGroupChat {
    pub(crate) fn apply(self, group: &mut GroupChat) -> Result<()> {
        if let Some(name) = self.name {
            require_non_empty("name", &name)?;
            group.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            group.description = description;
        }
        if let Some(pattern) = self.pattern {
            group.pattern = pattern;
        }
        Ok(())
    }
}

/// Request to run a group chat's team
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RunGroupChat {
    /// Task given to the team
    pub task: String,
}
