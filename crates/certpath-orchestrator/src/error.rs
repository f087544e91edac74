//! Error types for the CertPath orchestrator.
//!
//! This module defines the error hierarchy for all orchestrator operations,
//! including configuration loading, catalog lookups, session access, score
//! validation, and content generation.

use std::path::PathBuf;

use crate::content::ContentError;

/// A specialized `Result` type for CertPath orchestrator operations.
pub type Result<T> = std::result::Result<T, CertPathError>;

/// Errors that can occur while driving a learner through a curriculum.
///
/// Variants fall into three groups: configuration errors raised at startup,
/// caller errors that are never retried, and collaborator errors raised by
/// the external content generators.
#[derive(Debug, thiserror::Error)]
pub enum CertPathError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your certpath.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// The requested certification is not registered in the catalog.
    #[error("Unknown certification: '{certification}'\n\nSuggestion: Choose one of the certifications listed at GET /api/certifications")]
    UnknownCertification {
        /// The certification name that was requested.
        certification: String,
    },

    /// The certification is registered but has no topics.
    #[error("Certification '{certification}' has an empty curriculum\n\nSuggestion: Choose a certification with at least one topic")]
    EmptyCurriculum {
        /// The certification name with no topics.
        certification: String,
    },

    /// No session exists for the learner.
    #[error("No session found for learner '{learner_id}'\n\nSuggestion: Enroll the learner with POST /api/start first")]
    SessionNotFound {
        /// The learner identifier that was looked up.
        learner_id: String,
    },

    /// A submitted score is outside 0..=100.
    #[error("Invalid score {score}: scores must be between 0 and 100")]
    InvalidScore {
        /// The rejected score.
        score: i64,
    },

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// The content generator failed to produce a lesson or quiz.
    #[error("Content generation failed for topic '{topic}': {source}")]
    ContentGeneration {
        /// The topic that was being generated.
        topic: String,
        /// The underlying collaborator failure.
        #[source]
        source: ContentError,
    },
}

impl CertPathError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `UnknownCertification` error.
    #[must_use]
    pub fn unknown_certification(certification: impl Into<String>) -> Self {
        Self::UnknownCertification {
            certification: certification.into(),
        }
    }

    /// Creates a new `EmptyCurriculum` error.
    #[must_use]
    pub fn empty_curriculum(certification: impl Into<String>) -> Self {
        Self::EmptyCurriculum {
            certification: certification.into(),
        }
    }

    /// Creates a new `SessionNotFound` error.
    #[must_use]
    pub fn session_not_found(learner_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            learner_id: learner_id.into(),
        }
    }

    /// Creates a new `ContentGeneration` error.
    #[must_use]
    pub fn content_generation(topic: impl Into<String>, source: ContentError) -> Self {
        Self::ContentGeneration {
            topic: topic.into(),
            source,
        }
    }

    /// Returns `true` for errors caused by the request itself.
    ///
    /// Caller errors are surfaced directly and never retried.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownCertification { .. }
                | Self::EmptyCurriculum { .. }
                | Self::SessionNotFound { .. }
                | Self::InvalidScore { .. }
        )
    }

    /// Returns `true` if the error came from an external content collaborator.
    #[must_use]
    pub const fn is_collaborator_error(&self) -> bool {
        matches!(self, Self::ContentGeneration { .. })
    }

    /// Stable machine-readable name for this error, used in API responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParseError { .. } => "config_parse",
            Self::ConfigValidationError { .. } => "config_validation",
            Self::UnknownCertification { .. } => "unknown_certification",
            Self::EmptyCurriculum { .. } => "empty_curriculum",
            Self::SessionNotFound { .. } => "session_not_found",
            Self::InvalidScore { .. } => "invalid_score",
            Self::ContentGeneration { .. } => "content_generation",
        }
    }
}
