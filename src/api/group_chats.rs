//! Group chat API endpoints
//!
//! GET/POST       /api/v1/group-chats
//! GET/PUT/DELETE /api/v1/group-chats/:id
//! POST           /api/v1/group-chats/:id/participants
//! DELETE         /api/v1/group-chats/:id/participants/:agent_id
//! GET/POST       /api/v1/group-chats/:id/messages
//! POST           /api/v1/group-chats/:id/run

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use conclave_core::{
    CreateGroupChat, GroupChat, Hub, Message, PageQuery, PostMessage, RunGroupChat,
    TeamRunResult, UpdateGroupChat,
};
use std::sync::Arc;
use uuid::Uuid;

use super::conversations::AddParticipant;
use super::response::{ok, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};

#[utoipa::path(
    get,
    path = "/api/v1/group-chats",
    tag = "group-chats",
    params(PageQuery),
    responses((status = 200, description = "Group chats", body = Vec<GroupChat>))
)]
pub async fn list_group_chats(
    Extension(hub): Extension<Arc<Hub>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<GroupChat>> {
    ok(hub.group_chats.list(query).await?)
}

/// Create a group chat; `pattern` defaults to round_robin
#[utoipa::path(
    post,
    path = "/api/v1/group-chats",
    tag = "group-chats",
    request_body = CreateGroupChat,
    responses(
        (status = 201, description = "Group chat created", body = GroupChat),
        (status = 400, description = "Fewer than two participants or unknown pattern"),
        (status = 404, description = "Unknown participant"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_group_chat(
    Extension(hub): Extension<Arc<Hub>>,
    ApiJson(request): ApiJson<CreateGroupChat>,
) -> Result<impl IntoResponse, ApiError> {
    let group = hub.group_chats.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(group))))
}

#[utoipa::path(
    get,
    path = "/api/v1/group-chats/{id}",
    tag = "group-chats",
    params(("id" = Uuid, Path, description = "Group chat ID")),
    responses(
        (status = 200, description = "Group chat", body = GroupChat),
        (status = 404, description = "Group chat not found")
    )
)]
pub async fn get_group_chat(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<GroupChat> {
    ok(hub.group_chats.get(id).await?)
}

#[utoipa::path(
    put,
    path = "/api/v1/group-chats/{id}",
    tag = "group-chats",
    params(("id" = Uuid, Path, description = "Group chat ID")),
    request_body = UpdateGroupChat,
    responses(
        (status = 200, description = "Updated group chat", body = GroupChat),
        (status = 404, description = "Group chat not found"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn update_group_chat(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateGroupChat>,
) -> ApiResult<GroupChat> {
    ok(hub.group_chats.update(id, request).await?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/group-chats/{id}",
    tag = "group-chats",
    params(("id" = Uuid, Path, description = "Group chat ID")),
    responses(
        (status = 204, description = "Group chat deleted"),
        (status = 404, description = "Group chat not found")
    )
)]
pub async fn delete_group_chat(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    hub.group_chats.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/group-chats/{id}/participants",
    tag = "group-chats",
    params(("id" = Uuid, Path, description = "Group chat ID")),
    request_body = AddParticipant,
    responses(
        (status = 200, description = "Updated group chat", body = GroupChat),
        (status = 404, description = "Group chat or agent not found"),
        (status = 409, description = "Agent already a participant")
    )
)]
pub async fn add_group_participant(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AddParticipant>,
) -> ApiResult<GroupChat> {
    ok(hub.group_chats.add_participant(id, request.agent_id).await?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/group-chats/{id}/participants/{agent_id}",
    tag = "group-chats",
    params(
        ("id" = Uuid, Path, description = "Group chat ID"),
        ("agent_id" = Uuid, Path, description = "Participant to remove")
    ),
    responses(
        (status = 200, description = "Updated group chat", body = GroupChat),
        (status = 404, description = "Group chat or participant not found"),
        (status = 409, description = "Would leave fewer than two participants")
    )
)]
pub async fn remove_group_participant(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath((id, agent_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<GroupChat> {
    ok(hub.group_chats.remove_participant(id, agent_id).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/group-chats/{id}/messages",
    tag = "group-chats",
    params(("id" = Uuid, Path, description = "Group chat ID"), PageQuery),
    responses(
        (status = 200, description = "Messages by sequence number", body = Vec<Message>),
        (status = 404, description = "Group chat not found")
    )
)]
pub async fn list_group_messages(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Message>> {
    ok(hub.group_chats.messages(id, query).await?)
}

/// Post a message; recipients follow the group's routing pattern
#[utoipa::path(
    post,
    path = "/api/v1/group-chats/{id}/messages",
    tag = "group-chats",
    params(("id" = Uuid, Path, description = "Group chat ID")),
    request_body = PostMessage,
    responses(
        (status = 201, description = "Stored message with computed recipients", body = Message),
        (status = 404, description = "Group chat not found"),
        (status = 409, description = "Sender is not a participant")
    )
)]
pub async fn post_group_message(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<PostMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let message = hub.group_chats.post_message(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message))))
}

/// Run the group's agents as a team against a task
#[utoipa::path(
    post,
    path = "/api/v1/group-chats/{id}/run",
    tag = "group-chats",
    params(("id" = Uuid, Path, description = "Group chat ID")),
    request_body = RunGroupChat,
    responses(
        (status = 200, description = "Run transcript", body = TeamRunResult),
        (status = 400, description = "Empty task"),
        (status = 404, description = "Group chat or member agent not found")
    )
)]
pub async fn run_group_chat(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RunGroupChat>,
) -> ApiResult<TeamRunResult> {
    ok(hub.group_chats.run(id, request.task).await?)
}

/// Create group chat routes
pub fn group_chats_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/group-chats",
            get(list_group_chats).post(create_group_chat),
        )
        .route(
            "/api/v1/group-chats/:id",
            get(get_group_chat)
                .put(update_group_chat)
                .delete(delete_group_chat),
        )
        .route(
            "/api/v1/group-chats/:id/participants",
            post(add_group_participant),
        )
        .route(
            "/api/v1/group-chats/:id/participants/:agent_id",
            delete(remove_group_participant),
        )
        .route(
            "/api/v1/group-chats/:id/messages",
            get(list_group_messages).post(post_group_message),
        )
        .route("/api/v1/group-chats/:id/run", post(run_group_chat))
}
