//! Agents API endpoints
//!
//! GET    /api/v1/agents             - List agents
//! POST   /api/v1/agents             - Create an agent
//! GET    /api/v1/agents/:id         - Get an agent
//! PUT    /api/v1/agents/:id         - Update an agent
//! DELETE /api/v1/agents/:id         - Delete an agent
//! PUT    /api/v1/agents/:id/status  - Change an agent's status

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use conclave_core::{Agent, AgentStatus, CreateAgent, Hub, PageQuery, UpdateAgent};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::response::{ok, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};

/// Status change request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAgentStatus {
    /// New status
    pub status: AgentStatus,
}

/// List agents
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "agents",
    params(PageQuery),
    responses(
        (status = 200, description = "Agents ordered by creation time", body = Vec<Agent>)
    )
)]
pub async fn list_agents(
    Extension(hub): Extension<Arc<Hub>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Agent>> {
    ok(hub.agents.list(query).await?)
}

/// Create an agent
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "agents",
    request_body = CreateAgent,
    responses(
        (status = 201, description = "Agent created", body = Agent),
        (status = 400, description = "Invalid name or temperature"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_agent(
    Extension(hub): Extension<Arc<Hub>>,
    ApiJson(request): ApiJson<CreateAgent>,
) -> Result<impl IntoResponse, ApiError> {
    let agent = hub.agents.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(agent))))
}

/// Get an agent
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}",
    tag = "agents",
    params(("id" = Uuid, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent", body = Agent),
        (status = 404, description = "Agent not found")
    )
)]
pub async fn get_agent(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Agent> {
    ok(hub.agents.get(id).await?)
}

/// Update an agent
#[utoipa::path(
    put,
    path = "/api/v1/agents/{id}",
    tag = "agents",
    params(("id" = Uuid, Path, description = "Agent ID")),
    request_body = UpdateAgent,
    responses(
        (status = 200, description = "Updated agent", body = Agent),
        (status = 404, description = "Agent not found"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn update_agent(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateAgent>,
) -> ApiResult<Agent> {
    ok(hub.agents.update(id, request).await?)
}

/// Delete an agent
#[utoipa::path(
    delete,
    path = "/api/v1/agents/{id}",
    tag = "agents",
    params(("id" = Uuid, Path, description = "Agent ID")),
    responses(
        (status = 204, description = "Agent deleted"),
        (status = 404, description = "Agent not found")
    )
)]
pub async fn delete_agent(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    hub.agents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change an agent's status
#[utoipa::path(
    put,
    path = "/api/v1/agents/{id}/status",
    tag = "agents",
    params(("id" = Uuid, Path, description = "Agent ID")),
    request_body = UpdateAgentStatus,
    responses(
        (status = 200, description = "Agent with its new status", body = Agent),
        (status = 404, description = "Agent not found")
    )
)]
pub async fn update_agent_status(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateAgentStatus>,
) -> ApiResult<Agent> {
    ok(hub.agents.set_status(id, request.status).await?)
}

/// Create agent routes
pub fn agents_routes() -> Router {
    Router::new()
        .route("/api/v1/agents", get(list_agents).post(create_agent))
        .route(
            "/api/v1/agents/:id",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
        .route("/api/v1/agents/:id/status", put(update_agent_status))
}
