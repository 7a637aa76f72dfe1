//! Ad hoc team runs
//!
//! POST /api/v1/teams/run

use axum::{routing::post, Extension, Router};
use conclave_core::{Hub, TeamRunRequest, TeamRunResult};
use std::sync::Arc;

use super::response::{ok, ApiJson, ApiResult};

/// Run a team of named members against a task
#[utoipa::path(
    post,
    path = "/api/v1/teams/run",
    tag = "teams",
    request_body = TeamRunRequest,
    responses(
        (status = 200, description = "Run transcript", body = TeamRunResult),
        (status = 400, description = "Empty task, no participants or unknown pattern")
    )
)]
pub async fn run_team(
    Extension(hub): Extension<Arc<Hub>>,
    ApiJson(request): ApiJson<TeamRunRequest>,
) -> ApiResult<TeamRunResult> {
    ok(hub.teams.run(request).await?)
}

pub fn teams_routes() -> Router {
    Router::new().route("/api/v1/teams/run", post(run_team))
}
