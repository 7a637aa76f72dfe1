//! API Documentation - Swagger UI
//!
//! Provides OpenAPI documentation at /docs

use axum::Router;
use conclave_core::orders::{
    InventorySnapshot, OrderPriority, OrderRequest, OrderResult, OrderStatus, ShippingPlan,
    SupplierQuote,
};
use conclave_core::{
    Agent, AgentRole, AgentStatus, Conversation, CreateAgent, CreateConversation,
    CreateGroupChat, ExecutionRecord, ExecutionStatus, GroupChat, Message, PostMessage,
    RoutingPattern, RunGroupChat, RunStatus, SubmitExecution, TeamMember, TeamRunRequest,
    TeamRunResult, TranscriptEntry, UpdateAgent, UpdateGroupChat,
};
use conclave_sandbox::{Language, ResourceLimits, ResourceUsage, SandboxOutput};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{agents::UpdateAgentStatus, conversations::AddParticipant, executions::ExecutionSummary};

/// Conclave API OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Conclave API",
        version = "1.0.0",
        description = "Multi-agent coordination hub REST API.

## Overview
Conclave provides an API for:
- **Agents**: Register agents with a role, model settings and a system message
- **Conversations**: Direct threads where every message reaches all other participants
- **Group chats**: Named groups whose routing pattern decides who receives each message
- **Teams**: Ad hoc scripted team runs
- **Executions**: Queued code execution against a mocked sandbox
- **Orders**: Supply-chain order coordination through the default roster

Every response is wrapped in `{ success, data?, error?, code? }`.

## Events
Connect to `/ws/events` and send `{\"type\":\"join\",\"topic\":{\"kind\":\"conversation\",\"id\":\"...\"}}`
to receive messages for a thread.
",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Agents
        crate::api::agents::list_agents,
        crate::api::agents::create_agent,
        crate::api::agents::get_agent,
        crate::api::agents::update_agent,
        crate::api::agents::delete_agent,
        crate::api::agents::update_agent_status,
        // Conversations
        crate::api::conversations::list_conversations,
        crate::api::conversations::create_conversation,
        crate::api::conversations::get_conversation,
        crate::api::conversations::delete_conversation,
        crate::api::conversations::add_conversation_participant,
        crate::api::conversations::remove_conversation_participant,
        crate::api::conversations::list_conversation_messages,
        crate::api::conversations::post_conversation_message,
        // Group chats
        crate::api::group_chats::list_group_chats,
        crate::api::group_chats::create_group_chat,
        crate::api::group_chats::get_group_chat,
        crate::api::group_chats::update_group_chat,
        crate::api::group_chats::delete_group_chat,
        crate::api::group_chats::add_group_participant,
        crate::api::group_chats::remove_group_participant,
        crate::api::group_chats::list_group_messages,
        crate::api::group_chats::post_group_message,
        crate::api::group_chats::run_group_chat,
        // Teams
        crate::api::teams::run_team,
        // Executions
        crate::api::executions::handlers::list_executions,
        crate::api::executions::handlers::submit_execution,
        crate::api::executions::handlers::get_execution,
        crate::api::executions::handlers::delete_execution,
        crate::api::executions::handlers::cancel_execution,
        // Orders
        crate::api::orders::process_order,
    ),
    components(
        schemas(
            // Agents
            Agent,
            AgentRole,
            AgentStatus,
            CreateAgent,
            UpdateAgent,
            UpdateAgentStatus,
            // Threads
            Conversation,
            CreateConversation,
            AddParticipant,
            PostMessage,
            Message,
            GroupChat,
            CreateGroupChat,
            UpdateGroupChat,
            RunGroupChat,
            RoutingPattern,
            // Teams
            TeamRunRequest,
            TeamMember,
            TeamRunResult,
            TranscriptEntry,
            RunStatus,
            // Executions
            SubmitExecution,
            ExecutionRecord,
            ExecutionSummary,
            ExecutionStatus,
            Language,
            ResourceLimits,
            SandboxOutput,
            ResourceUsage,
            // Orders
            OrderRequest,
            OrderResult,
            OrderPriority,
            OrderStatus,
            SupplierQuote,
            InventorySnapshot,
            ShippingPlan,
        )
    ),
    tags(
        (name = "agents", description = "Agent registry"),
        (name = "conversations", description = "Direct conversations"),
        (name = "group-chats", description = "Group chats and their routing"),
        (name = "teams", description = "Scripted team runs"),
        (name = "executions", description = "Queued code execution"),
        (name = "orders", description = "Order coordination"),
    )
)]
pub struct ApiDoc;

/// Create documentation routes
pub fn docs_routes() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_resource() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/v1/agents/{id}/status",
            "/api/v1/conversations/{id}/messages",
            "/api/v1/group-chats/{id}/run",
            "/api/v1/teams/run",
            "/api/v1/executions/{id}/cancel",
            "/api/v1/orders/process",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}"
            );
        }
    }

    #[test]
    fn test_openapi_registers_schemas() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        for name in ["Agent", "GroupChat", "ExecutionRecord", "OrderResult", "RoutingPattern"] {
            assert!(components.schemas.contains_key(name), "missing schema {name}");
        }
    }
}
