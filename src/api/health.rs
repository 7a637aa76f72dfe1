//! Health check endpoints.
//!
//! Provides:
//! - `/health`: simple "healthy" + version (for load balancers)
//! - `/health/detailed`: entity counts, execution backlog and event bus fan-out

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use conclave_core::{Hub, HubStats};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

const SERVICE_NAME: &str = "conclave";

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Detailed health response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<EntityCounts>,
}

/// Counts reported by `/health/detailed`
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EntityCounts {
    pub agents: usize,
    pub conversations: usize,
    pub group_chats: usize,
    pub executions: BTreeMap<String, usize>,
    pub queue_depth: usize,
    pub event_subscribers: usize,
}

impl From<HubStats> for EntityCounts {
    fn from(stats: HubStats) -> Self {
        Self {
            agents: stats.agents,
            conversations: stats.conversations,
            group_chats: stats.group_chats,
            executions: stats
                .executions
                .into_iter()
                .map(|(status, count)| (status.as_str().to_string(), count))
                .collect(),
            queue_depth: stats.queue_depth,
            event_subscribers: stats.event_subscribers,
        }
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn detailed_health_check(Extension(hub): Extension<Arc<Hub>>) -> Json<DetailedHealthResponse> {
    let start = Instant::now();
    let stats = hub.stats().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let response = match stats {
        Ok(stats) => DetailedHealthResponse {
            status: "healthy",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            latency_ms,
            error: None,
            counts: Some(stats.into()),
        },
        Err(e) => DetailedHealthResponse {
            status: "unhealthy",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            latency_ms,
            error: Some(e.to_string()),
            counts: None,
        },
    };
    Json(response)
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::ExecutionStatus;

    #[test]
    fn test_health_response_serialization() {
        let resp = HealthResponse {
            status: "healthy",
            service: SERVICE_NAME,
            version: "0.1.0",
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("conclave"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn test_counts_key_executions_by_status_name() {
        let mut executions = BTreeMap::new();
        executions.insert(ExecutionStatus::Pending, 2);
        executions.insert(ExecutionStatus::Completed, 5);
        let counts = EntityCounts::from(HubStats {
            agents: 4,
            conversations: 1,
            group_chats: 0,
            executions,
            queue_depth: 2,
            event_subscribers: 3,
        });

        assert_eq!(counts.agents, 4);
        assert_eq!(counts.executions.get("pending"), Some(&2));
        assert_eq!(counts.executions.get("completed"), Some(&5));
        assert_eq!(counts.event_subscribers, 3);
    }

    #[test]
    fn test_unhealthy_response_omits_counts() {
        let resp = DetailedHealthResponse {
            status: "unhealthy",
            service: SERVICE_NAME,
            version: "0.1.0",
            latency_ms: 0,
            error: Some("store unavailable".to_string()),
            counts: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("counts").is_none());
        assert_eq!(json["error"], "store unavailable");
    }
}
