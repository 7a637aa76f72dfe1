//! Conversations API endpoints
//!
//! GET/POST   /api/v1/conversations
//! GET/DELETE /api/v1/conversations/:id
//! POST       /api/v1/conversations/:id/participants
//! DELETE     /api/v1/conversations/:id/participants/:agent_id
//! GET/POST   /api/v1/conversations/:id/messages

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use conclave_core::{Conversation, CreateConversation, Hub, Message, PageQuery, PostMessage};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::response::{ok, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};

/// Add-participant request, shared with group chats
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddParticipant {
    /// Agent to add
    pub agent_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "conversations",
    params(PageQuery),
    responses((status = 200, description = "Conversations", body = Vec<Conversation>))
)]
pub async fn list_conversations(
    Extension(hub): Extension<Arc<Hub>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Conversation>> {
    ok(hub.conversations.list(query).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    tag = "conversations",
    request_body = CreateConversation,
    responses(
        (status = 201, description = "Conversation created", body = Conversation),
        (status = 400, description = "Fewer than two participants"),
        (status = 404, description = "Unknown participant")
    )
)]
pub async fn create_conversation(
    Extension(hub): Extension<Arc<Hub>>,
    ApiJson(request): ApiJson<CreateConversation>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = hub.conversations.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(conversation))))
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}",
    tag = "conversations",
    params(("id" = Uuid, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation", body = Conversation),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn get_conversation(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Conversation> {
    ok(hub.conversations.get(id).await?)
}

/// Delete a conversation and its messages
#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{id}",
    tag = "conversations",
    params(("id" = Uuid, Path, description = "Conversation ID")),
    responses(
        (status = 204, description = "Conversation deleted"),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn delete_conversation(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    hub.conversations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/participants",
    tag = "conversations",
    params(("id" = Uuid, Path, description = "Conversation ID")),
    request_body = AddParticipant,
    responses(
        (status = 200, description = "Updated conversation", body = Conversation),
        (status = 404, description = "Conversation or agent not found"),
        (status = 409, description = "Agent already a participant")
    )
)]
pub async fn add_conversation_participant(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AddParticipant>,
) -> ApiResult<Conversation> {
    ok(hub.conversations.add_participant(id, request.agent_id).await?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{id}/participants/{agent_id}",
    tag = "conversations",
    params(
        ("id" = Uuid, Path, description = "Conversation ID"),
        ("agent_id" = Uuid, Path, description = "Participant to remove")
    ),
    responses(
        (status = 200, description = "Updated conversation", body = Conversation),
        (status = 404, description = "Conversation or participant not found"),
        (status = 409, description = "Would leave fewer than two participants")
    )
)]
pub async fn remove_conversation_participant(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath((id, agent_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Conversation> {
    ok(hub.conversations.remove_participant(id, agent_id).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/messages",
    tag = "conversations",
    params(("id" = Uuid, Path, description = "Conversation ID"), PageQuery),
    responses(
        (status = 200, description = "Messages by sequence number", body = Vec<Message>),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn list_conversation_messages(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Message>> {
    ok(hub.conversations.messages(id, query).await?)
}

/// Post a message; every other participant receives it
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/messages",
    tag = "conversations",
    params(("id" = Uuid, Path, description = "Conversation ID")),
    request_body = PostMessage,
    responses(
        (status = 201, description = "Stored message", body = Message),
        (status = 400, description = "Empty content"),
        (status = 404, description = "Conversation not found"),
        (status = 409, description = "Sender is not a participant")
    )
)]
pub async fn post_conversation_message(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<PostMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let message = hub.conversations.post_message(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message))))
}

/// Create conversation routes
pub fn conversations_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/v1/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route(
            "/api/v1/conversations/:id/participants",
            post(add_conversation_participant),
        )
        .route(
            "/api/v1/conversations/:id/participants/:agent_id",
            delete(remove_conversation_participant),
        )
        .route(
            "/api/v1/conversations/:id/messages",
            get(list_conversation_messages).post(post_conversation_message),
        )
}
