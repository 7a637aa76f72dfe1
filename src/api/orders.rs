//! Order coordination
//!
//! POST /api/v1/orders/process

use axum::{routing::post, Extension, Router};
use conclave_core::{Hub, OrderRequest, OrderResult};
use std::sync::Arc;

use super::response::{ok, ApiJson, ApiResult};

/// Process an order through the default roster
///
/// Every field of the request is optional; see `OrderRequest` for defaults.
#[utoipa::path(
    post,
    path = "/api/v1/orders/process",
    tag = "orders",
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Coordinated order", body = OrderResult),
        (status = 400, description = "Zero quantity")
    )
)]
pub async fn process_order(
    Extension(hub): Extension<Arc<Hub>>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<OrderResult> {
    ok(hub.orders.process(request).await?)
}

/// Create order routes
pub fn orders_routes() -> Router {
    Router::new().route("/api/v1/orders/process", post(process_order))
}
