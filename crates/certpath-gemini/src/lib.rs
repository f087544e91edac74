//! CertPath Gemini Content Generation
//!
//! Lesson and quiz generation through the Gemini `generateContent` API.
//!
//! [`GeminiClient`] implements the orchestrator's [`LessonGenerator`] and
//! [`QuizGenerator`] contracts. Gemini failures are reported as
//! [`GeminiError`] and converted to [`ContentError`] at the trait boundary.
//!
//! [`LessonGenerator`]: certpath_orchestrator::LessonGenerator
//! [`QuizGenerator`]: certpath_orchestrator::QuizGenerator

mod client;
mod prompt;

use certpath_orchestrator::ContentError;
use thiserror::Error;

pub use client::{GeminiClient, API_KEY_ENV};
pub use prompt::{lesson_prompt, quiz_prompt};

/// Errors that can occur while calling Gemini.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// No API key was configured.
    #[error("Gemini API key not configured: set {0}")]
    NotConfigured(&'static str),

    /// The request did not complete before the configured timeout.
    #[error("Gemini request timed out after {seconds}s")]
    Timeout {
        /// The configured timeout.
        seconds: u64,
    },

    /// The request could not be sent or the response could not be read.
    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Gemini answered with a non-success status.
    #[error("Gemini returned HTTP {status}: {body}")]
    HttpStatus {
        /// The response status.
        status: reqwest::StatusCode,
        /// The response body, as text.
        body: String,
    },

    /// The response body was not a valid `generateContent` response.
    #[error("Gemini response could not be decoded: {0}")]
    Json(#[from] serde_json::Error),

    /// The response contained no candidate text.
    #[error("Gemini returned no candidates")]
    EmptyCandidates,
}

impl From<GeminiError> for ContentError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::NotConfigured(_) => Self::Unavailable,
            GeminiError::Timeout { seconds } => Self::Timeout { seconds },
            other => Self::upstream(other.to_string()),
        }
    }
}
