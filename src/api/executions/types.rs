use chrono::{DateTime, Utc};
use conclave_core::{ExecutionRecord, ExecutionStatus, PageQuery};
use conclave_sandbox::Language;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query parameters for listing executions
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListExecutionsQuery {
    /// Items to skip
    pub skip: Option<usize>,
    /// Items to return
    pub take: Option<usize>,
    /// Only records in this status
    pub status: Option<ExecutionStatus>,
}

impl ListExecutionsQuery {
    pub(crate) fn page(&self) -> PageQuery {
        PageQuery {
            skip: self.skip,
            take: self.take,
        }
    }
}

/// Execution summary for list view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExecutionSummary {
    pub id: Uuid,
    pub language: Language,
    pub status: ExecutionStatus,
    pub conversation_id: Option<Uuid>,
    pub exit_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ExecutionRecord> for ExecutionSummary {
    fn from(record: ExecutionRecord) -> Self {
        Self {
            id: record.id,
            language: record.language,
            status: record.status,
            conversation_id: record.conversation_id,
            exit_code: record.result.map(|output| output.exit_code),
            created_at: record.created_at,
            completed_at: record.completed_at,
        }
    }
}
