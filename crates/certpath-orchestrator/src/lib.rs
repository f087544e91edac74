//! CertPath Orchestrator
//!
//! Drives learners through certification curricula, adapting to their quiz
//! performance, and serves the HTTP API and WebSocket progress events.

pub mod api;
pub mod config;
pub mod content;
pub mod curriculum;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod session;
pub mod store;

pub use api::{
    create_router, ApiError, AppState, CertificationsResponse, ErrorResponse, LearnerRequest,
    LessonResponse, QuizResponse, StartRequest, SubmitScoreRequest,
};
pub use config::{Config, GeminiConfig, GenerationSettings, QuizSettings, CONFIG_FILE_NAME};
pub use content::{
    ContentError, FeedbackComposer, LessonGenerator, Quiz, QuizDecodeError, QuizGenerator,
    QuizQuestion, TieredFeedback,
};
pub use curriculum::{Catalog, Curriculum};
pub use error::{CertPathError, Result};
pub use events::{EventBroadcaster, ProgressEvent};
pub use orchestrator::{Enrollment, NextAction, Orchestrator, ScoreOutcome, COMPLETION_MESSAGE};
pub use session::{Pace, Progress, Score, Session, SessionStatus, Tier, Transition};
pub use store::{SessionHandle, SessionStore};
