//! Web API module for Conclave
//!
//! Provides REST API endpoints for:
//! - Agent registry
//! - Conversations and group chats with their message logs
//! - Team runs and order coordination
//! - Code execution

pub mod agents;
pub mod conversations;
pub mod docs;
pub mod executions;
pub mod group_chats;
pub mod health;
pub mod orders;
pub mod response;
pub mod teams;

use axum::Router;

pub use agents::agents_routes;
pub use conversations::conversations_routes;
pub use docs::docs_routes;
pub use executions::executions_routes;
pub use group_chats::group_chats_routes;
pub use health::health_routes;
pub use orders::orders_routes;
pub use teams::teams_routes;

/// Create the API router with all `/api/v1` endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(agents_routes())
        .merge(conversations_routes())
        .merge(group_chats_routes())
        .merge(teams_routes())
        .merge(executions_routes())
        .merge(orders_routes())
}
