use super::*;
use chrono::Utc;
use conclave_core::{
    AgentStatus, CreateAgent, CreateConversation, ExecutionStatus, HubConfig, HubEvent,
    Message as ThreadMessage,
};

fn message_event(conversation_id: Uuid) -> HubEvent {
    HubEvent::MessageReceived {
        conversation_id,
        message: ThreadMessage {
            id: Uuid::new_v4(),
            thread_id: conversation_id,
            sender_id: Uuid::new_v4(),
            recipients: vec![],
            content: "hi".to_string(),
            sequence_number: 1,
            created_at: Utc::now(),
        },
    }
}

async fn hub_with_conversation() -> (Hub, Uuid) {
    let hub = Hub::new(HubConfig::default());
    let a = hub.agents.create(CreateAgent::named("alpha")).await.unwrap();
    let b = hub.agents.create(CreateAgent::named("beta")).await.unwrap();
    let conversation = hub
        .conversations
        .create(CreateConversation {
            title: "pair".to_string(),
            participant_ids: vec![a.id, b.id],
        })
        .await
        .unwrap();
    (hub, conversation.id)
}

#[test]
fn test_join_request_deserialization() {
    let id = Uuid::new_v4();
    let json = format!(r#"{{"type":"join","topic":{{"kind":"conversation","id":"{id}"}}}}"#);
    let request: SubscriptionRequest = serde_json::from_str(&json).unwrap();
    assert!(matches!(
        request,
        SubscriptionRequest::Join { topic: Topic::Conversation(t) } if t == id
    ));

    let ping: SubscriptionRequest = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
    assert!(matches!(ping, SubscriptionRequest::Ping));
}

#[test]
fn test_unknown_request_type_is_rejected() {
    assert!(serde_json::from_str::<SubscriptionRequest>(r#"{"type":"subscribe"}"#).is_err());
}

#[test]
fn test_scoped_events_need_a_joined_topic() {
    let conversation_id = Uuid::new_v4();
    let mut state = SubscriptionState::new();
    assert!(!state.wants(&message_event(conversation_id)));

    state.join(Topic::Conversation(conversation_id));
    assert!(state.wants(&message_event(conversation_id)));
    assert!(!state.wants(&message_event(Uuid::new_v4())));

    state.leave(&Topic::Conversation(conversation_id));
    assert!(!state.wants(&message_event(conversation_id)));
}

#[test]
fn test_unscoped_events_reach_everyone() {
    let state = SubscriptionState::new();
    assert!(state.wants(&HubEvent::AgentStatusChanged {
        agent_id: Uuid::new_v4(),
        previous: AgentStatus::Idle,
        status: AgentStatus::Busy,
    }));
    assert!(state.wants(&HubEvent::ExecutionCompleted {
        execution_id: Uuid::new_v4(),
        conversation_id: None,
        status: ExecutionStatus::Completed,
    }));
}

#[test]
fn test_pushed_frame_carries_event_type() {
    let json = serde_json::to_value(message_event(Uuid::nil())).unwrap();
    assert_eq!(json["type"], "message_received");
    assert_eq!(json["message"]["content"], "hi");
}

#[test]
fn test_notification_serialization() {
    let json = serde_json::to_value(EventNotification::Subscribed {
        topics: vec![Topic::GroupChat(Uuid::nil())],
    })
    .unwrap();
    assert_eq!(json["type"], "subscribed");
    assert_eq!(json["topics"][0]["kind"], "group_chat");

    let pong = serde_json::to_string(&EventNotification::Pong).unwrap();
    assert_eq!(pong, r#"{"type":"pong"}"#);
}

#[tokio::test]
async fn test_join_existing_conversation() {
    let (hub, conversation_id) = hub_with_conversation().await;
    let mut state = SubscriptionState::new();

    let response = handle_subscription_request(
        SubscriptionRequest::Join {
            topic: Topic::Conversation(conversation_id),
        },
        &mut state,
        &hub,
    )
    .await;

    match response {
        EventNotification::Subscribed { topics } => {
            assert_eq!(topics, vec![Topic::Conversation(conversation_id)]);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_thread_is_refused() {
    let hub = Hub::new(HubConfig::default());
    let mut state = SubscriptionState::new();

    let response = handle_subscription_request(
        SubscriptionRequest::Join {
            topic: Topic::GroupChat(Uuid::new_v4()),
        },
        &mut state,
        &hub,
    )
    .await;

    match response {
        EventNotification::Error { code, .. } => assert_eq!(code.as_deref(), Some("NOT_FOUND")),
        other => panic!("unexpected response: {other:?}"),
    }
    assert!(state.topics.is_empty());
}

#[tokio::test]
async fn test_ping_pong() {
    let hub = Hub::new(HubConfig::default());
    let mut state = SubscriptionState::new();
    let response = handle_subscription_request(SubscriptionRequest::Ping, &mut state, &hub).await;
    assert!(matches!(response, EventNotification::Pong));
}
