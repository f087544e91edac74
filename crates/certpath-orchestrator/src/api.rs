//! HTTP API endpoints for the CertPath orchestrator.
//!
//! # Endpoints
//!
//! - `POST /api/start` - Enroll a learner in a certification
//! - `POST /api/teach` - Generate a lesson for the current topic
//! - `POST /api/assess` - Generate a quiz for the current topic
//! - `POST /api/submit-score` - Record a quiz score
//! - `GET /api/progress/:learner_id` - Get a learner's progress
//! - `GET /api/certifications` - List available certifications
//! - `GET /ws` - Stream progress events over WebSocket
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use certpath_orchestrator::{create_router, AppState, Catalog, Orchestrator};
//! # use certpath_orchestrator::{LessonGenerator, QuizGenerator};
//!
//! # async fn example(lessons: Arc<dyn LessonGenerator>, quizzes: Arc<dyn QuizGenerator>) {
//! let orchestrator = Orchestrator::new(Catalog::builtin(), lessons, quizzes);
//! let router = create_router(AppState::new(orchestrator));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::content::Quiz;
use crate::curriculum::Curriculum;
use crate::error::CertPathError;
use crate::events;
use crate::orchestrator::{Enrollment, Orchestrator, ScoreOutcome};
use crate::session::Progress;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /api/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// The learner to enroll.
    pub learner_id: String,
    /// The certification to enroll in.
    pub certification: String,
}

/// Request body for endpoints that only need a learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerRequest {
    /// The learner the request is for.
    pub learner_id: String,
}

/// Request body for `POST /api/submit-score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    /// The learner submitting the score.
    pub learner_id: String,
    /// Raw score; validated by the orchestrator.
    pub score: i64,
}

/// Response body for `POST /api/teach`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonResponse {
    /// The generated lesson text.
    pub lesson: String,
}

/// Response body for `POST /api/assess`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    /// The generated quiz. Empty if generation failed.
    pub quiz: Quiz,
}

/// Response body for `GET /api/certifications`.
#[derive(Debug, Clone, Serialize)]
pub struct CertificationsResponse {
    /// Every registered curriculum, sorted by name.
    pub certifications: Vec<Curriculum>,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
    /// Machine-readable error kind.
    pub kind: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The orchestrator every handler delegates to.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Wraps `orchestrator` for sharing across handlers.
    #[must_use]
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Orchestrator error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(CertPathError);

impl From<CertPathError> for ApiError {
    fn from(err: CertPathError) -> Self {
        Self(err)
    }
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match &self.0 {
            CertPathError::UnknownCertification { .. } | CertPathError::SessionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            CertPathError::EmptyCurriculum { .. } | CertPathError::InvalidScore { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CertPathError::ContentGeneration { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), kind = self.0.kind(), error = %self.0, "Request rejected");

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind().to_string(),
        });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints and the `/ws` stream.
///
/// CORS allows any origin and every request is traced.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/start", post(handle_start))
        .route("/teach", post(handle_teach))
        .route("/assess", post(handle_assess))
        .route("/submit-score", post(handle_submit_score))
        .route("/progress/:learner_id", get(handle_progress))
        .route("/certifications", get(handle_certifications));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handle_ws))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

async fn handle_start(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<Enrollment>, ApiError> {
    let enrollment = state
        .orchestrator
        .enroll(&request.learner_id, &request.certification)
        .await?;
    Ok(Json(enrollment))
}

async fn handle_teach(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LearnerRequest>,
) -> Result<Json<LessonResponse>, ApiError> {
    let lesson = state.orchestrator.request_lesson(&request.learner_id).await?;
    Ok(Json(LessonResponse { lesson }))
}

async fn handle_assess(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LearnerRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = state.orchestrator.request_quiz(&request.learner_id).await?;
    Ok(Json(QuizResponse { quiz }))
}

async fn handle_submit_score(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitScoreRequest>,
) -> Result<Json<ScoreOutcome>, ApiError> {
    let outcome = state
        .orchestrator
        .submit_score(&request.learner_id, request.score)
        .await?;
    Ok(Json(outcome))
}

async fn handle_progress(
    State(state): State<Arc<AppState>>,
    Path(learner_id): Path<String>,
) -> Result<Json<Progress>, ApiError> {
    let progress = state.orchestrator.progress(&learner_id).await?;
    Ok(Json(progress))
}

async fn handle_certifications(State(state): State<Arc<AppState>>) -> Json<CertificationsResponse> {
    let certifications = state
        .orchestrator
        .catalog()
        .curricula()
        .cloned()
        .collect();
    Json(CertificationsResponse { certifications })
}

async fn handle_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("New WebSocket connection request");
    let broadcaster = state.orchestrator.events().clone();
    ws.on_upgrade(move |socket| events::stream_to_socket(socket, broadcaster))
}

// ============================================================================
// Tests
// ============================================================================
