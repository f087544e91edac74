//! Learner session state for the CertPath orchestrator.
//!
//! This module defines the per-learner progress record and the
//! performance-driven transition policy applied on every quiz score.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::error::{CertPathError, Result};

/// Lowest score that still counts as a pass.
pub const PASS_THRESHOLD: u8 = 70;

/// Lowest score that advances the learner to the next topic.
pub const ADVANCE_THRESHOLD: u8 = 90;

// ============================================================================
// Score and Tier
// ============================================================================

/// A quiz score between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Validates a raw score.
    ///
    /// # Errors
    ///
    /// Returns `CertPathError::InvalidScore` if `value` is outside 0..=100.
    ///
    /// # Examples
    ///
    /// ```
    /// use certpath_orchestrator::Score;
    ///
    /// assert_eq!(Score::new(85).unwrap().value(), 85);
    /// assert!(Score::new(101).is_err());
    /// assert!(Score::new(-5).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(CertPathError::InvalidScore { score: value })
    }

    /// The raw score value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = CertPathError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Performance band a score falls into.
///
/// Bands are inclusive on their lower bound: `>= 90`, `70..=89`, `< 70`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// 90 and above.
    Excellent,
    /// 70 up to 89.
    Good,
    /// Below 70.
    NeedsReteach,
}

impl Tier {
    /// Classifies a score.
    #[must_use]
    pub const fn for_score(score: Score) -> Self {
        if score.0 >= ADVANCE_THRESHOLD {
            Self::Excellent
        } else if score.0 >= PASS_THRESHOLD {
            Self::Good
        } else {
            Self::NeedsReteach
        }
    }
}

// ============================================================================
// Pace and SessionStatus
// ============================================================================

/// Learning pace for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    /// Default pace.
    #[default]
    Normal,
    /// Set after any failing score and never reset automatically.
    Slow,
}

/// Where a session is in its curriculum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The learner is working on `current_index`.
    #[default]
    InProgress,
    /// The learner advanced past the last topic. Terminal.
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

// ============================================================================
// Transition
// ============================================================================

/// The transition taken by a submitted score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    /// Score >= 90 and another topic remains.
    Advanced {
        /// The topic the learner moved to.
        #[serde(rename = "nextTopic")]
        next_topic: String,
    },
    /// Score >= 90 on the last topic.
    CurriculumCompleted,
    /// Score in 70..=89; topic marked complete, learner stays.
    OptionalReview,
    /// Score below 70; topic marked weak, pace set to slow.
    Reteach,
    /// The session was already completed; the score was only recorded.
    AlreadyCompleted,
}

// ============================================================================
// Session
// ============================================================================

/// A learner's progress through one certification curriculum.
#[derive(Debug, Clone)]
pub struct Session {
    curriculum: Arc<Curriculum>,
    status: SessionStatus,
    current_index: usize,
    current_topic: String,
    completed_topics: Vec<String>,
    score_history: Vec<Score>,
    weak_topics: Vec<String>,
    pace: Pace,
    enrolled_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Starts a fresh session at the first topic of `curriculum`.
    ///
    /// Returns `None` if the curriculum has no topics.
    #[must_use]
    pub fn start(curriculum: Arc<Curriculum>) -> Option<Self> {
        let current_topic = curriculum.topic(0)?.to_string();
        let now = Utc::now();
        Some(Self {
            curriculum,
            status: SessionStatus::InProgress,
            current_index: 0,
            current_topic,
            completed_topics: Vec::new(),
            score_history: Vec::new(),
            weak_topics: Vec::new(),
            pace: Pace::Normal,
            enrolled_at: now,
            updated_at: now,
        })
    }

    /// The certification this session is enrolled in.
    #[must_use]
    pub fn certification(&self) -> &str {
        &self.curriculum.certification
    }

    /// The topic the learner is currently on.
    #[must_use]
    pub fn current_topic(&self) -> &str {
        &self.current_topic
    }

    /// Position of the current topic in the curriculum.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns `true` once the learner has advanced past the last topic.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Current pace.
    #[must_use]
    pub const fn pace(&self) -> Pace {
        self.pace
    }

    /// Every submitted score, in submission order.
    #[must_use]
    pub fn score_history(&self) -> &[Score] {
        &self.score_history
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Records `score` and applies the transition policy.
    ///
    /// Every score is appended to the history. On a completed session nothing
    /// else changes.
    pub fn apply_score(&mut self, score: Score) -> Transition {
        self.score_history.push(score);
        self.touch();

        if self.is_completed() {
            return Transition::AlreadyCompleted;
        }

        let transition = match Tier::for_score(score) {
            Tier::Excellent => self.advance(),
            Tier::Good => {
                self.completed_topics.push(self.current_topic.clone());
                Transition::OptionalReview
            }
            Tier::NeedsReteach => {
                self.weak_topics.push(self.current_topic.clone());
                self.pace = Pace::Slow;
                Transition::Reteach
            }
        };

        debug_assert_eq!(
            self.curriculum.topic(self.current_index),
            Some(self.current_topic.as_str()),
            "current topic must track the curriculum index"
        );

        transition
    }

    fn advance(&mut self) -> Transition {
        self.completed_topics.push(self.current_topic.clone());

        let next_index = self.current_index + 1;
        match self.curriculum.topic(next_index) {
            Some(next_topic) => {
                self.current_index = next_index;
                self.current_topic = next_topic.to_string();
                Transition::Advanced {
                    next_topic: self.current_topic.clone(),
                }
            }
            None => {
                // Index and topic stay frozen on the last topic.
                self.status = SessionStatus::Completed;
                Transition::CurriculumCompleted
            }
        }
    }

    /// An immutable snapshot of this session's progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            certification: self.certification().to_string(),
            current_topic: self.current_topic.clone(),
            current_index: self.current_index,
            completed_topics: self.completed_topics.clone(),
            score_history: self.score_history.clone(),
            weak_topics: self.weak_topics.clone(),
            pace: self.pace,
            status: self.status,
            completed: self.is_completed(),
            enrolled_at: self.enrolled_at,
            updated_at: self.updated_at,
        }
    }
}

/// Snapshot of a session returned by progress queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// The enrolled certification.
    pub certification: String,
    /// The topic the learner is on.
    pub current_topic: String,
    /// Position of the current topic.
    pub current_index: usize,
    /// Topics passed, in pass order. May repeat a topic.
    pub completed_topics: Vec<String>,
    /// Every submitted score, in submission order.
    pub score_history: Vec<Score>,
    /// Topics with a failing score, in order. May repeat.
    pub weak_topics: Vec<String>,
    /// Current pace.
    pub pace: Pace,
    /// Current status.
    pub status: SessionStatus,
    /// Whether the curriculum is finished.
    pub completed: bool,
    /// When the learner enrolled.
    pub enrolled_at: DateTime<Utc>,
    /// When the session last changed.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Tests
// ============================================================================
