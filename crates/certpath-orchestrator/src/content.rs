//! Content collaborator contracts.
//!
//! Lesson and quiz generation live outside this crate. The orchestrator only
//! sees a topic-name-in, content-out contract, plus a pure feedback composer
//! keyed on the score tier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::{Score, Tier};

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Failures reported by an external content generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// The generator is not configured (for example, a missing API key).
    #[error("content generator is not available")]
    Unavailable,

    /// The generator did not answer within its deadline.
    #[error("content generator timed out after {seconds}s")]
    Timeout {
        /// The deadline that elapsed.
        seconds: u64,
    },

    /// The generator answered with an error.
    #[error("content generator failed: {message}")]
    Upstream {
        /// Description of the upstream failure.
        message: String,
    },
}

impl ContentError {
    /// Creates a new `Upstream` error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Produces free-form lesson text for a topic.
#[async_trait]
pub trait LessonGenerator: Send + Sync {
    /// Generates a lesson for `topic`.
    async fn generate_lesson(&self, topic: &str) -> Result<String, ContentError>;
}

/// Produces a raw quiz payload for a topic.
///
/// Implementations should aim for the JSON shape accepted by
/// [`Quiz::decode`]; the orchestrator decides what to do when they miss.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Generates a quiz for `topic` as an undecoded payload.
    async fn generate_quiz(&self, topic: &str) -> Result<String, ContentError>;
}

/// Turns a score into human-readable feedback.
pub trait FeedbackComposer: Send + Sync {
    /// Composes feedback for `score`. Must be deterministic per tier.
    fn compose(&self, score: Score) -> String;
}

/// The default three-tier feedback composer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredFeedback;

impl FeedbackComposer for TieredFeedback {
    fn compose(&self, score: Score) -> String {
        match Tier::for_score(score) {
            Tier::Excellent => "Excellent performance! Move to next section.",
            Tier::Good => "Good job! Reinforce weak areas and continue.",
            Tier::NeedsReteach => {
                "Score below 70%. Re-teaching simplified explanation recommended."
            }
        }
        .to_string()
    }
}

// ============================================================================
// Quiz
// ============================================================================

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// The question text.
    pub question: String,
    /// The answer options, in display order.
    pub options: Vec<String>,
    /// The correct option, matching one entry of `options` exactly.
    pub answer: String,
}

/// A decoded quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// The quiz questions, in order.
    pub questions: Vec<QuizQuestion>,
}

/// Reasons a quiz payload was rejected.
#[derive(Debug, thiserror::Error)]
pub enum QuizDecodeError {
    /// The payload is not JSON of the expected shape.
    #[error("quiz payload is not valid quiz JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A question has no text.
    #[error("question {index} has no text")]
    BlankQuestion {
        /// Zero-based index of the question.
        index: usize,
    },

    /// A question has no options.
    #[error("question {index} has no options")]
    NoOptions {
        /// Zero-based index of the question.
        index: usize,
    },

    /// A question's answer is not one of its options.
    #[error("question {index} answer '{answer}' is not one of its options")]
    AnswerNotAnOption {
        /// Zero-based index of the question.
        index: usize,
        /// The answer that failed to match.
        answer: String,
    },
}

impl Quiz {
    /// The canonical quiz with no questions.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            questions: Vec::new(),
        }
    }

    /// Decodes and validates a raw quiz payload.
    ///
    /// A surrounding Markdown code fence (` ```json ... ``` `) is tolerated.
    ///
    /// # Examples
    ///
    /// ```
    /// use certpath_orchestrator::Quiz;
    ///
    /// let quiz = Quiz::decode(
    ///     r#"{"questions":[{"question":"2+2?","options":["3","4"],"answer":"4"}]}"#,
    /// )
    /// .unwrap();
    /// assert_eq!(quiz.questions.len(), 1);
    ///
    /// assert!(Quiz::decode("not json").is_err());
    /// ```
    pub fn decode(raw: &str) -> Result<Self, QuizDecodeError> {
        let quiz: Self = serde_json::from_str(strip_code_fence(raw))?;

        for (index, question) in quiz.questions.iter().enumerate() {
            if question.question.trim().is_empty() {
                return Err(QuizDecodeError::BlankQuestion { index });
            }
            if question.options.is_empty() {
                return Err(QuizDecodeError::NoOptions { index });
            }
            if !question.options.contains(&question.answer) {
                return Err(QuizDecodeError::AnswerNotAnOption {
                    index,
                    answer: question.answer.clone(),
                });
            }
        }

        Ok(quiz)
    }

    /// Returns `true` if the quiz has no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
