//! Server initialization and main run loop

use super::config::{AppConfig, ServerConfig};
use crate::api;
use crate::websocket::websocket_router;
use anyhow::{Context, Result};
use axum::{http::HeaderValue, routing::get, Extension, Router};
use conclave_core::{wait_for_shutdown_signal, Hub, ShutdownController};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the full application router over a hub
pub fn build_router(hub: Arc<Hub>, server: &ServerConfig) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::docs_routes())
        .merge(api::api_router())
        .merge(websocket_router())
        .route("/", get(|| async { "Conclave" }))
        .layer(Extension(hub))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Run the server until Ctrl+C or SIGTERM
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Starting Conclave v{}", env!("CARGO_PKG_VERSION"));

    let hub = Arc::new(Hub::new(config.hub_config()));

    if config.seed.default_agents {
        hub.agents
            .seed_defaults()
            .await
            .context("Failed to seed default agents")?;
    }

    let shutdown = ShutdownController::with_timeout(Duration::from_secs(
        config.server.shutdown_timeout_secs,
    ));
    let dispatcher = hub
        .executions
        .start(shutdown.clone())
        .context("Failed to start execution dispatcher")?;
    hub.executions
        .recover()
        .await
        .context("Failed to recover executions")?;

    let app = build_router(hub, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);
    info!("Swagger UI at http://{}/docs", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            server_shutdown.shutdown().await;
        })
        .await
        .context("HTTP server error")?;

    match tokio::time::timeout(Duration::from_secs(5), dispatcher).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Execution dispatcher task error: {}", e),
        Err(_) => warn!("Execution dispatcher did not stop in time"),
    }

    info!("Conclave shutdown complete");
    Ok(())
}
