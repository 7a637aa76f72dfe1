//! Events WebSocket handler
//!
//! Clients join conversation or group chat topics and receive the hub events
//! scoped to them, plus every unscoped event.

use std::sync::Arc;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use conclave_core::{Hub, Topic};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use uuid::Uuid;

mod types;

#[cfg(test)]
mod tests;

pub use types::{EventNotification, SubscriptionRequest, SubscriptionState};

/// WebSocket upgrade handler
pub async fn events_handler(
    ws: WebSocketUpgrade,
    Extension(hub): Extension<Arc<Hub>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let session_id = Uuid::new_v4();
    info!("WebSocket events connection established: {}", session_id);

    let (mut sender, mut receiver) = socket.split();

    if let Some(json) = encode(&EventNotification::Connected { session_id }) {
        let _ = sender.send(Message::Text(json)).await;
    }

    let mut state = SubscriptionState::new();
    let mut event_rx = hub.events.subscribe();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received subscription request: {}", text);
                        let response = match serde_json::from_str::<SubscriptionRequest>(&text) {
                            Ok(request) => handle_subscription_request(request, &mut state, &hub).await,
                            Err(e) => EventNotification::Error {
                                message: format!("Invalid message format: {}", e),
                                code: Some("INVALID_MESSAGE".to_string()),
                            },
                        };
                        if let Some(json) = encode(&response) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket events connection closed: {}", session_id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !state.wants(&event) {
                            continue;
                        }
                        if let Some(json) = encode(&event) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(session_id = %session_id, lagged = n, "Event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket events connection ended: {}", session_id);
}

fn encode<T: Serialize>(frame: &T) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to encode WebSocket frame: {}", e);
            None
        }
    }
}

/// Handle a join, leave or ping.
///
/// Joining a thread that does not exist is refused so a typo does not
/// leave the client silently waiting.
async fn handle_subscription_request(
    request: SubscriptionRequest,
    state: &mut SubscriptionState,
    hub: &Hub,
) -> EventNotification {
    match request {
        SubscriptionRequest::Join { topic } => {
            if let Err(e) = topic_exists(hub, topic).await {
                return EventNotification::Error {
                    message: e.to_string(),
                    code: Some(e.code().to_string()),
                };
            }
            state.join(topic);
            debug!(?topic, "Joined topic");
            EventNotification::Subscribed {
                topics: state.topics(),
            }
        }
        SubscriptionRequest::Leave { topic } => {
            state.leave(&topic);
            debug!(?topic, "Left topic");
            EventNotification::Subscribed {
                topics: state.topics(),
            }
        }
        SubscriptionRequest::Ping => EventNotification::Pong,
    }
}

async fn topic_exists(hub: &Hub, topic: Topic) -> conclave_core::Result<()> {
    match topic {
        Topic::Conversation(id) => hub.conversations.get(id).await.map(|_| ()),
        Topic::GroupChat(id) => hub.group_chats.get(id).await.map(|_| ()),
    }
}

