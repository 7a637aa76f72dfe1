use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use conclave_core::{ExecutionRecord, Hub, SubmitExecution};
use std::sync::Arc;
use uuid::Uuid;

use super::super::response::{ok, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use super::types::{ExecutionSummary, ListExecutionsQuery};

/// List executions by submission time
#[utoipa::path(
    get,
    path = "/api/v1/executions",
    tag = "executions",
    params(ListExecutionsQuery),
    responses(
        (status = 200, description = "List of executions", body = Vec<ExecutionSummary>),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_executions(
    Extension(hub): Extension<Arc<Hub>>,
    ApiQuery(query): ApiQuery<ListExecutionsQuery>,
) -> ApiResult<Vec<ExecutionSummary>> {
    let records = hub.executions.list(query.page(), query.status).await?;
    ok(records.into_iter().map(ExecutionSummary::from).collect())
}

/// Submit code for execution
///
/// The record is stored as `pending` and handed to the dispatcher; poll
/// `GET /api/v1/executions/{id}` or listen for `execution_completed`.
#[utoipa::path(
    post,
    path = "/api/v1/executions",
    tag = "executions",
    request_body = SubmitExecution,
    responses(
        (status = 202, description = "Execution accepted", body = ExecutionRecord),
        (status = 400, description = "Unsupported language, empty code or bad timeout"),
        (status = 404, description = "Unknown conversation or agent"),
        (status = 409, description = "Execution queue is full"),
        (status = 500, description = "Execution queue unavailable")
    )
)]
pub async fn submit_execution(
    Extension(hub): Extension<Arc<Hub>>,
    ApiJson(request): ApiJson<SubmitExecution>,
) -> Result<impl IntoResponse, ApiError> {
    let record = hub.executions.submit(request).await?;
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(record))))
}

/// Get execution details
#[utoipa::path(
    get,
    path = "/api/v1/executions/{id}",
    tag = "executions",
    params(("id" = Uuid, Path, description = "Execution ID")),
    responses(
        (status = 200, description = "Execution record", body = ExecutionRecord),
        (status = 404, description = "Execution not found")
    )
)]
pub async fn get_execution(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ExecutionRecord> {
    ok(hub.executions.get(id).await?)
}

/// Delete a finished execution
#[utoipa::path(
    delete,
    path = "/api/v1/executions/{id}",
    tag = "executions",
    params(("id" = Uuid, Path, description = "Execution ID")),
    responses(
        (status = 204, description = "Execution deleted"),
        (status = 404, description = "Execution not found"),
        (status = 409, description = "Execution still pending or running")
    )
)]
pub async fn delete_execution(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    hub.executions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel a pending or running execution
#[utoipa::path(
    post,
    path = "/api/v1/executions/{id}/cancel",
    tag = "executions",
    params(("id" = Uuid, Path, description = "Execution ID")),
    responses(
        (status = 200, description = "Record after the cancel request", body = ExecutionRecord),
        (status = 404, description = "Execution not found"),
        (status = 409, description = "Execution already finished")
    )
)]
pub async fn cancel_execution(
    Extension(hub): Extension<Arc<Hub>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ExecutionRecord> {
    ok(hub.executions.cancel(id).await?)
}
