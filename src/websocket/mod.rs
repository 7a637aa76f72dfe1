//! WebSocket module for Conclave
//!
//! Provides the real-time endpoint:
//! - /ws/events - Hub event stream filtered by joined topics

pub mod events;

pub use events::events_handler;

use axum::{routing::get, Router};

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new().route("/ws/events", get(events_handler))
}
