//! The progress orchestrator.
//!
//! Ties the catalog, the session store, and the content collaborators
//! together behind the five learner-facing operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::content::{FeedbackComposer, LessonGenerator, Quiz, QuizGenerator, TieredFeedback};
use crate::curriculum::Catalog;
use crate::error::{CertPathError, Result};
use crate::events::{EventBroadcaster, ProgressEvent};
use crate::session::{Progress, Score, Session, Transition};
use crate::store::{SessionHandle, SessionStore};

/// Message returned once the last topic is passed.
pub const COMPLETION_MESSAGE: &str = "🎉 Certification curriculum completed!";

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a successful enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// Human-readable confirmation.
    pub message: String,
    /// The first topic of the curriculum.
    pub current_topic: String,
}

/// What the learner should do after a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Topic passed with room for improvement; review is optional.
    OptionalReview,
    /// Topic failed; it will be taught again.
    Reteach,
}

/// Result of a score submission.
///
/// Exactly one of `next_action`, `next_topic`, or `message` is set, except
/// for scores submitted after completion, which carry only feedback and the
/// `completed` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    /// Feedback composed for the score.
    pub feedback: String,
    /// Follow-up action when the learner stays on the topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    /// The new topic after an advance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_topic: Option<String>,
    /// Completion message when the curriculum is finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the curriculum is finished. Absent for review and reteach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ScoreOutcome {
    fn from_transition(feedback: String, transition: &Transition) -> Self {
        let mut outcome = Self {
            feedback,
            next_action: None,
            next_topic: None,
            message: None,
            completed: None,
        };
        match transition {
            Transition::Advanced { next_topic } => {
                outcome.next_topic = Some(next_topic.clone());
                outcome.completed = Some(false);
            }
            Transition::CurriculumCompleted => {
                outcome.message = Some(COMPLETION_MESSAGE.to_string());
                outcome.completed = Some(true);
            }
            Transition::OptionalReview => outcome.next_action = Some(NextAction::OptionalReview),
            Transition::Reteach => outcome.next_action = Some(NextAction::Reteach),
            Transition::AlreadyCompleted => outcome.completed = Some(true),
        }
        outcome
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives learners through their curricula.
///
/// The orchestrator exclusively owns every session. Collaborator calls are
/// made with no session lock held.
#[derive(Clone)]
pub struct Orchestrator {
    catalog: Arc<Catalog>,
    sessions: Arc<SessionStore>,
    lessons: Arc<dyn LessonGenerator>,
    quizzes: Arc<dyn QuizGenerator>,
    feedback: Arc<dyn FeedbackComposer>,
    events: EventBroadcaster,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("catalog", &self.catalog)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with the default tiered feedback composer.
    #[must_use]
    pub fn new(
        catalog: Catalog,
        lessons: Arc<dyn LessonGenerator>,
        quizzes: Arc<dyn QuizGenerator>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            sessions: Arc::new(SessionStore::new()),
            lessons,
            quizzes,
            feedback: Arc::new(TieredFeedback),
            events: EventBroadcaster::default(),
        }
    }

    /// Replaces the feedback composer.
    #[must_use]
    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackComposer>) -> Self {
        self.feedback = feedback;
        self
    }

    /// Replaces the event broadcaster.
    #[must_use]
    pub fn with_events(mut self, events: EventBroadcaster) -> Self {
        self.events = events;
        self
    }

    /// The curriculum catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The event broadcaster progress events are published on.
    #[must_use]
    pub const fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    /// Enrolls `learner_id` in `certification`, replacing any prior session.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCertification` or `EmptyCurriculum` from the catalog;
    /// no session is created in that case.
    pub async fn enroll(&self, learner_id: &str, certification: &str) -> Result<Enrollment> {
        let curriculum = self.catalog.topics_for(certification)?;
        let session = Session::start(curriculum)
            .ok_or_else(|| CertPathError::empty_curriculum(certification))?;
        let current_topic = session.current_topic().to_string();

        // Published under the entry lock so it precedes any later event for
        // this learner.
        let guard = self.sessions.replace(learner_id, session).await;
        info!(learner_id, certification, topic = %current_topic, "Learner enrolled");
        self.events.send(ProgressEvent::enrolled(
            learner_id,
            certification,
            current_topic.clone(),
        ));
        drop(guard);

        Ok(Enrollment {
            message: format!("Started {certification}"),
            current_topic,
        })
    }

    /// Generates a lesson for the learner's current topic.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for an unknown learner and
    /// `ContentGeneration` if the lesson generator fails.
    pub async fn request_lesson(&self, learner_id: &str) -> Result<String> {
        let topic = self.current_topic(learner_id).await?;

        debug!(learner_id, topic = %topic, "Requesting lesson");
        self.lessons
            .generate_lesson(&topic)
            .await
            .map_err(|e| CertPathError::content_generation(topic, e))
    }

    /// Generates a quiz for the learner's current topic.
    ///
    /// A generator failure or an undecodable payload yields [`Quiz::empty`].
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for an unknown learner.
    pub async fn request_quiz(&self, learner_id: &str) -> Result<Quiz> {
        let topic = self.current_topic(learner_id).await?;

        debug!(learner_id, topic = %topic, "Requesting quiz");
        let raw = match self.quizzes.generate_quiz(&topic).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(learner_id, topic = %topic, error = %e, "Quiz generation failed, serving empty quiz");
                return Ok(Quiz::empty());
            }
        };

        match Quiz::decode(&raw) {
            Ok(quiz) => Ok(quiz),
            Err(e) => {
                warn!(learner_id, topic = %topic, error = %e, "Quiz payload rejected, serving empty quiz");
                Ok(Quiz::empty())
            }
        }
    }

    /// Records a score and applies the transition policy.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for an unknown learner and `InvalidScore`
    /// for a score outside 0..=100.
    pub async fn submit_score(&self, learner_id: &str, score: i64) -> Result<ScoreOutcome> {
        let handle = self.session(learner_id).await?;
        let score = Score::new(score)?;

        // The guard is held until the events are sent, so events for one
        // learner go out in commit order.
        let mut session = handle.lock().await;
        let topic = session.current_topic().to_string();
        let transition = session.apply_score(score);
        let feedback = self.feedback.compose(score);

        info!(
            learner_id,
            topic = %topic,
            score = score.value(),
            transition = ?transition,
            "Score recorded"
        );

        let outcome = ScoreOutcome::from_transition(feedback, &transition);
        let completed_now = transition == Transition::CurriculumCompleted;

        self.events.send(ProgressEvent::score_recorded(
            learner_id, topic, score, transition,
        ));
        if completed_now {
            let certification = session.certification().to_string();
            info!(learner_id, certification = %certification, "Curriculum completed");
            self.events
                .send(ProgressEvent::curriculum_completed(learner_id, certification));
        }
        drop(session);

        Ok(outcome)
    }

    /// Returns a snapshot of the learner's progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for an unknown learner.
    pub async fn progress(&self, learner_id: &str) -> Result<Progress> {
        let handle = self.session(learner_id).await?;
        let progress = handle.lock().await.progress();
        Ok(progress)
    }

    async fn session(&self, learner_id: &str) -> Result<SessionHandle> {
        self.sessions
            .get(learner_id)
            .await
            .ok_or_else(|| CertPathError::session_not_found(learner_id))
    }

    /// Reads the current topic and releases the session lock before returning.
    async fn current_topic(&self, learner_id: &str) -> Result<String> {
        let handle = self.session(learner_id).await?;
        let topic = handle.lock().await.current_topic().to_string();
        Ok(topic)
    }
}

// ============================================================================
// Tests
// ============================================================================
