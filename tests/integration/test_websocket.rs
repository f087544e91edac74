//! Integration tests for WebSocket progress event streaming.
//!
//! These tests connect real WebSocket clients to `/ws` and check the events
//! produced by HTTP requests against the same server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use certpath_orchestrator::{
    create_router, AppState, Catalog, ContentError, LessonGenerator, Orchestrator, QuizGenerator,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

/// Helper type for WebSocket client
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct NoContent;

#[async_trait]
impl LessonGenerator for NoContent {
    async fn generate_lesson(&self, _topic: &str) -> Result<String, ContentError> {
        Err(ContentError::Unavailable)
    }
}

#[async_trait]
impl QuizGenerator for NoContent {
    async fn generate_quiz(&self, _topic: &str) -> Result<String, ContentError> {
        Err(ContentError::Unavailable)
    }
}

/// Spawns a server with a two-topic track and returns its `host:port`.
async fn spawn_test_server() -> String {
    let content = Arc::new(NoContent);
    let orchestrator = Orchestrator::new(
        Catalog::from_entries([("Two Topics", ["A", "B"])]),
        Arc::clone(&content) as Arc<dyn LessonGenerator>,
        content as Arc<dyn QuizGenerator>,
    );
    let router = create_router(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    addr.to_string()
}

/// Connects a WebSocket client and consumes its `connected` event.
async fn connect_client(addr: &str) -> WsClient {
    let (mut ws_stream, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect to WebSocket");
    let event = receive_event(&mut ws_stream).await;
    assert_eq!(event["event"], "connected");
    ws_stream
}

/// Receives the next text message as JSON, answering pings on the way.
async fn receive_event(client: &mut WsClient) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => panic!("Expected text message, got: {other:?}"),
        }
    }
}

async fn post(addr: &str, path: &str, body: Value) -> reqwest::StatusCode {
    reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .json(&body)
        .send()
        .await
        .expect("Request failed")
        .status()
}

// ============================================================================
// Event Stream Tests
// ============================================================================

#[tokio::test]
async fn test_client_receives_connected_event_on_connect() {
    let addr = spawn_test_server().await;
    let (mut client, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect to WebSocket");

    let event = receive_event(&mut client).await;
    assert_eq!(event["event"], "connected");
    assert!(event["payload"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_progress_events_follow_requests() {
    let addr = spawn_test_server().await;
    let mut client = connect_client(&addr).await;

    let status = post(
        &addr,
        "/api/start",
        json!({ "learnerId": "ws-learner", "certification": "Two Topics" }),
    )
    .await;
    assert!(status.is_success());

    let event = receive_event(&mut client).await;
    assert_eq!(event["event"], "enrolled");
    assert_eq!(event["payload"]["learnerId"], "ws-learner");
    assert_eq!(event["payload"]["currentTopic"], "A");

    post(
        &addr,
        "/api/submit-score",
        json!({ "learnerId": "ws-learner", "score": 91 }),
    )
    .await;
    let event = receive_event(&mut client).await;
    assert_eq!(event["event"], "score_recorded");
    assert_eq!(event["payload"]["topic"], "A");
    assert_eq!(event["payload"]["score"], 91);
    assert_eq!(event["payload"]["transition"]["type"], "advanced");
    assert_eq!(event["payload"]["transition"]["nextTopic"], "B");

    post(
        &addr,
        "/api/submit-score",
        json!({ "learnerId": "ws-learner", "score": 99 }),
    )
    .await;
    let event = receive_event(&mut client).await;
    assert_eq!(event["event"], "score_recorded");
    assert_eq!(event["payload"]["transition"]["type"], "curriculum_completed");

    let event = receive_event(&mut client).await;
    assert_eq!(event["event"], "curriculum_completed");
    assert_eq!(event["payload"]["certification"], "Two Topics");
}

#[tokio::test]
async fn test_rejected_requests_publish_nothing() {
    let addr = spawn_test_server().await;
    let mut client = connect_client(&addr).await;

    let status = post(
        &addr,
        "/api/start",
        json!({ "learnerId": "l", "certification": "Missing" }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);

    post(
        &addr,
        "/api/start",
        json!({ "learnerId": "l", "certification": "Two Topics" }),
    )
    .await;

    // The first event seen is the successful enrollment.
    let event = receive_event(&mut client).await;
    assert_eq!(event["event"], "enrolled");
}

#[tokio::test]
async fn test_multiple_clients_receive_same_events() {
    let addr = spawn_test_server().await;
    let mut first = connect_client(&addr).await;
    let mut second = connect_client(&addr).await;

    post(
        &addr,
        "/api/start",
        json!({ "learnerId": "shared", "certification": "Two Topics" }),
    )
    .await;

    for client in [&mut first, &mut second] {
        let event = receive_event(client).await;
        assert_eq!(event["event"], "enrolled");
        assert_eq!(event["payload"]["learnerId"], "shared");
    }
}

#[tokio::test]
async fn test_client_close_is_handled() {
    let addr = spawn_test_server().await;
    let mut client = connect_client(&addr).await;

    client.close(None).await.expect("Failed to close");

    // The server keeps serving other clients.
    let mut other = connect_client(&addr).await;
    post(
        &addr,
        "/api/start",
        json!({ "learnerId": "after-close", "certification": "Two Topics" }),
    )
    .await;
    assert_eq!(receive_event(&mut other).await["event"], "enrolled");
}
