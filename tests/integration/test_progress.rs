//! Integration tests for the learner progress HTTP API.
//!
//! These tests run the full router on a real TCP listener and drive learners
//! through curricula with an HTTP client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{routing::post, Json, Router};
use certpath_gemini::GeminiClient;
use certpath_orchestrator::{
    create_router, AppState, Catalog, ContentError, GeminiConfig, LessonGenerator, Orchestrator,
    QuizGenerator,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Records every topic it is asked about and answers from fixed text.
#[derive(Default)]
struct RecordingContent {
    topics: Mutex<Vec<String>>,
    quiz_payload: Option<String>,
}

#[async_trait]
impl LessonGenerator for RecordingContent {
    async fn generate_lesson(&self, topic: &str) -> Result<String, ContentError> {
        self.topics.lock().unwrap().push(topic.to_string());
        Ok(format!("Lesson: {topic}"))
    }
}

#[async_trait]
impl QuizGenerator for RecordingContent {
    async fn generate_quiz(&self, topic: &str) -> Result<String, ContentError> {
        self.topics.lock().unwrap().push(topic.to_string());
        self.quiz_payload
            .clone()
            .ok_or_else(|| ContentError::upstream("no quiz scripted"))
    }
}

/// Binds the orchestrator's router to an ephemeral port and returns its base URL.
async fn spawn_server(orchestrator: Orchestrator) -> String {
    let router = create_router(AppState::new(orchestrator));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}")
}

async fn spawn_builtin(content: Arc<RecordingContent>) -> String {
    spawn_server(Orchestrator::new(
        Catalog::builtin(),
        Arc::clone(&content) as Arc<dyn LessonGenerator>,
        content as Arc<dyn QuizGenerator>,
    ))
    .await
}

struct Api {
    base: String,
    http: reqwest::Client,
}

impl Api {
    fn new(base: String) -> Self {
        Self {
            base,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("Failed to build client"),
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .http
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .expect("Request failed");
        let status = response.status();
        (status, response.json().await.expect("Invalid JSON body"))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .http
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .expect("Request failed");
        let status = response.status();
        (status, response.json().await.expect("Invalid JSON body"))
    }

    async fn submit(&self, learner: &str, score: i64) -> Value {
        let (status, body) = self
            .post(
                "/api/submit-score",
                json!({ "learnerId": learner, "score": score }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "submit failed: {body}");
        body
    }
}

// ============================================================================
// Curriculum Walkthrough Tests
// ============================================================================

/// Walks a learner through the whole Cloud Practitioner track, including a
/// reteach and a soft-complete along the way.
#[tokio::test]
async fn test_full_cloud_practitioner_walkthrough() {
    let content = Arc::new(RecordingContent::default());
    let api = Api::new(spawn_builtin(Arc::clone(&content)).await);

    let (status, body) = api
        .post(
            "/api/start",
            json!({ "learnerId": "maria", "certification": "AWS Cloud Practitioner" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentTopic"], "Cloud Concepts");

    let (status, body) = api.post("/api/teach", json!({ "learnerId": "maria" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lesson"], "Lesson: Cloud Concepts");

    let body = api.submit("maria", 55).await;
    assert_eq!(body["nextAction"], "reteach");

    let body = api.submit("maria", 80).await;
    assert_eq!(body["nextAction"], "optional_review");

    let body = api.submit("maria", 92).await;
    assert_eq!(body["nextTopic"], "Security & Compliance");
    assert_eq!(body["completed"], false);

    assert_eq!(api.submit("maria", 100).await["nextTopic"], "Technology");
    assert_eq!(api.submit("maria", 90).await["nextTopic"], "Billing & Pricing");

    let body = api.submit("maria", 97).await;
    assert_eq!(body["completed"], true);
    assert_eq!(body["message"], "🎉 Certification curriculum completed!");

    // Scores after completion are recorded but change nothing else.
    let body = api.submit("maria", 20).await;
    assert!(body.get("nextAction").is_none());

    let (status, progress) = api.get("/api/progress/maria").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["currentTopic"], "Billing & Pricing");
    assert_eq!(progress["completed"], true);
    assert_eq!(progress["pace"], "slow");
    assert_eq!(progress["weakTopics"], json!(["Cloud Concepts"]));
    assert_eq!(
        progress["completedTopics"],
        json!([
            "Cloud Concepts",
            "Cloud Concepts",
            "Security & Compliance",
            "Technology",
            "Billing & Pricing"
        ])
    );
    assert_eq!(progress["scoreHistory"], json!([55, 80, 92, 100, 90, 97, 20]));

    assert_eq!(*content.topics.lock().unwrap(), vec!["Cloud Concepts"]);
}

#[tokio::test]
async fn test_learners_progress_independently() {
    let api = Api::new(spawn_builtin(Arc::new(RecordingContent::default())).await);

    api.post(
        "/api/start",
        json!({ "learnerId": "a", "certification": "AWS Cloud Practitioner" }),
    )
    .await;
    api.post(
        "/api/start",
        json!({ "learnerId": "b", "certification": "AWS Solutions Architect Associate" }),
    )
    .await;

    api.submit("a", 95).await;

    let (_, a) = api.get("/api/progress/a").await;
    let (_, b) = api.get("/api/progress/b").await;
    assert_eq!(a["currentTopic"], "Security & Compliance");
    assert_eq!(b["currentTopic"], "Design Resilient Architectures");
    assert_eq!(b["scoreHistory"], json!([]));
}

#[tokio::test]
async fn test_concurrent_submissions_for_one_learner_are_all_recorded() {
    let api = Arc::new(Api::new(
        spawn_builtin(Arc::new(RecordingContent::default())).await,
    ));
    api.post(
        "/api/start",
        json!({ "learnerId": "busy", "certification": "AWS Cloud Practitioner" }),
    )
    .await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let api = Arc::clone(&api);
        tasks.push(tokio::spawn(async move { api.submit("busy", 50).await }));
    }
    for task in tasks {
        task.await.expect("Task panicked");
    }

    let (_, progress) = api.get("/api/progress/busy").await;
    assert_eq!(progress["scoreHistory"].as_array().unwrap().len(), 10);
    assert_eq!(progress["weakTopics"].as_array().unwrap().len(), 10);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_rejections_use_error_bodies() {
    let api = Api::new(spawn_builtin(Arc::new(RecordingContent::default())).await);

    let (status, body) = api
        .post(
            "/api/start",
            json!({ "learnerId": "x", "certification": "aws cloud practitioner" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "unknown_certification");

    let (status, body) = api.get("/api/progress/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "session_not_found");

    api.post(
        "/api/start",
        json!({ "learnerId": "x", "certification": "AWS Cloud Practitioner" }),
    )
    .await;
    let (status, body) = api
        .post("/api/submit-score", json!({ "learnerId": "x", "score": -3 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "invalid_score");
}

#[tokio::test]
async fn test_failed_quiz_generation_serves_empty_quiz() {
    let api = Api::new(spawn_builtin(Arc::new(RecordingContent::default())).await);
    api.post(
        "/api/start",
        json!({ "learnerId": "q", "certification": "AWS Cloud Practitioner" }),
    )
    .await;

    let (status, body) = api.post("/api/assess", json!({ "learnerId": "q" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quiz"]["questions"], json!([]));
}

#[tokio::test]
async fn test_fenced_quiz_payload_is_decoded() {
    let content = Arc::new(RecordingContent {
        quiz_payload: Some(
            "```json\n{\"questions\":[{\"question\":\"What is IaaS?\",\"options\":[\"Infra\",\"Pizza\"],\"answer\":\"Infra\"}]}\n```"
                .to_string(),
        ),
        ..RecordingContent::default()
    });
    let api = Api::new(spawn_builtin(content).await);
    api.post(
        "/api/start",
        json!({ "learnerId": "q", "certification": "AWS Cloud Practitioner" }),
    )
    .await;

    let (_, body) = api.post("/api/assess", json!({ "learnerId": "q" })).await;
    assert_eq!(body["quiz"]["questions"][0]["answer"], "Infra");
}

// ============================================================================
// Gemini End-to-End Tests
// ============================================================================

/// Serves a canned `generateContent` reply and returns the stub base URL.
async fn spawn_gemini_stub(text: &'static str) -> String {
    let router = Router::new().route(
        "/models/:call",
        post(move || async move {
            Json(json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Stub failed");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_lesson_served_through_gemini_client() {
    let endpoint = spawn_gemini_stub("## Concept\nElasticity.").await;
    let gemini = Arc::new(
        GeminiClient::new(
            GeminiConfig {
                api_endpoint: endpoint,
                ..GeminiConfig::default()
            },
            Some("test-key".to_string()),
        )
        .expect("Failed to build Gemini client"),
    );
    let api = Api::new(
        spawn_server(Orchestrator::new(
            Catalog::builtin(),
            Arc::clone(&gemini) as Arc<dyn LessonGenerator>,
            gemini as Arc<dyn QuizGenerator>,
        ))
        .await,
    );

    api.post(
        "/api/start",
        json!({ "learnerId": "g", "certification": "AWS Cloud Practitioner" }),
    )
    .await;

    let (status, body) = api.post("/api/teach", json!({ "learnerId": "g" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lesson"], "## Concept\nElasticity.");

    // Prose is not a quiz; the learner still gets a well-formed empty one.
    let (status, body) = api.post("/api/assess", json!({ "learnerId": "g" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quiz"]["questions"], json!([]));
}

#[tokio::test]
async fn test_lesson_without_api_key_returns_502() {
    let gemini = Arc::new(
        GeminiClient::new(GeminiConfig::default(), None).expect("Failed to build Gemini client"),
    );
    let api = Api::new(
        spawn_server(Orchestrator::new(
            Catalog::builtin(),
            Arc::clone(&gemini) as Arc<dyn LessonGenerator>,
            gemini as Arc<dyn QuizGenerator>,
        ))
        .await,
    );

    api.post(
        "/api/start",
        json!({ "learnerId": "nokey", "certification": "AWS Cloud Practitioner" }),
    )
    .await;

    let (status, body) = api.post("/api/teach", json!({ "learnerId": "nokey" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "content_generation");
}
