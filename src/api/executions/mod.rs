//! Executions API endpoints
//!
//! GET    /api/v1/executions            - List executions
//! POST   /api/v1/executions            - Submit code (202)
//! GET    /api/v1/executions/:id        - Get execution details
//! DELETE /api/v1/executions/:id        - Delete a finished execution
//! POST   /api/v1/executions/:id/cancel - Cancel

pub mod handlers;
pub mod types;

#[cfg(test)]
mod tests;

pub use handlers::{
    cancel_execution, delete_execution, get_execution, list_executions, submit_execution,
};
pub use types::{ExecutionSummary, ListExecutionsQuery};

use axum::{
    routing::{get, post},
    Router,
};

/// Create executions routes
pub fn executions_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/executions",
            get(list_executions).post(submit_execution),
        )
        .route(
            "/api/v1/executions/:id",
            get(get_execution).delete(delete_execution),
        )
        .route("/api/v1/executions/:id/cancel", post(cancel_execution))
}
