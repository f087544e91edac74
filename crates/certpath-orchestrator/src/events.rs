//! Progress events and WebSocket streaming.
//!
//! The orchestrator publishes an event for every enrollment and every
//! recorded score. Clients connected to `/ws` receive them as JSON text
//! frames in publication order.
//!
//! # Example
//!
//! ```
//! use certpath_orchestrator::events::{EventBroadcaster, ProgressEvent};
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(16);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(ProgressEvent::curriculum_completed("learner-1", "AWS Cloud Practitioner"));
//!
//! if let Ok(event) = receiver.recv().await {
//!     assert_eq!(event.event_name(), "curriculum_completed");
//! }
//! # }
//! ```

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::session::{Score, Transition};

/// Default per-subscriber buffer size.
pub const DEFAULT_EVENT_BUFFER: usize = 100;

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    /// When the client connected.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `enrolled` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledPayload {
    /// The learner who enrolled.
    pub learner_id: String,
    /// The chosen certification.
    pub certification: String,
    /// The starting topic.
    pub current_topic: String,
    /// When the enrollment happened.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `score_recorded` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecordedPayload {
    /// The learner who submitted the score.
    pub learner_id: String,
    /// The topic the score was recorded against.
    pub topic: String,
    /// The submitted score.
    pub score: Score,
    /// The transition the score triggered.
    pub transition: Transition,
    /// When the score was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `curriculum_completed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumCompletedPayload {
    /// The learner who finished.
    pub learner_id: String,
    /// The finished certification.
    pub certification: String,
    /// When the curriculum was completed.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Progress events, serialized with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Sent to a client right after it connects.
    Connected(ConnectedPayload),
    /// A learner enrolled or re-enrolled.
    Enrolled(EnrolledPayload),
    /// A score was recorded.
    ScoreRecorded(ScoreRecordedPayload),
    /// A learner advanced past the last topic.
    CurriculumCompleted(CurriculumCompletedPayload),
}

impl ProgressEvent {
    /// Creates a `Connected` event.
    #[must_use]
    pub fn connected() -> Self {
        Self::Connected(ConnectedPayload {
            timestamp: Utc::now(),
        })
    }

    /// Creates an `Enrolled` event.
    #[must_use]
    pub fn enrolled(
        learner_id: impl Into<String>,
        certification: impl Into<String>,
        current_topic: impl Into<String>,
    ) -> Self {
        Self::Enrolled(EnrolledPayload {
            learner_id: learner_id.into(),
            certification: certification.into(),
            current_topic: current_topic.into(),
            timestamp: Utc::now(),
        })
    }

    /// Creates a `ScoreRecorded` event.
    #[must_use]
    pub fn score_recorded(
        learner_id: impl Into<String>,
        topic: impl Into<String>,
        score: Score,
        transition: Transition,
    ) -> Self {
        Self::ScoreRecorded(ScoreRecordedPayload {
            learner_id: learner_id.into(),
            topic: topic.into(),
            score,
            transition,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `CurriculumCompleted` event.
    #[must_use]
    pub fn curriculum_completed(
        learner_id: impl Into<String>,
        certification: impl Into<String>,
    ) -> Self {
        Self::CurriculumCompleted(CurriculumCompletedPayload {
            learner_id: learner_id.into(),
            certification: certification.into(),
            timestamp: Utc::now(),
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Enrolled(_) => "enrolled",
            Self::ScoreRecorded(_) => "score_recorded",
            Self::CurriculumCompleted(_) => "curriculum_completed",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Fans progress events out to every subscriber.
///
/// Events are not kept for clients that connect later.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ProgressEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster with `capacity` events of buffer per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event, returning how many subscribers will see it.
    pub fn send(&self, event: ProgressEvent) -> usize {
        // Err only means nobody is listening.
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

// ============================================================================
// WebSocket Streaming
// ============================================================================

/// Streams events from `broadcaster` to one WebSocket client until it leaves.
///
/// Sends a `connected` event first, then every published event. Pings the
/// client periodically and disconnects after repeated missed pongs.
pub async fn stream_to_socket(socket: WebSocket, broadcaster: EventBroadcaster) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before greeting so nothing published after `connected` is lost.
    let mut events = broadcaster.subscribe();

    let Ok(connected) = serde_json::to_string(&ProgressEvent::connected()) else {
        warn!("Failed to serialize connected event");
        return;
    };
    if sender.send(Message::Text(connected)).await.is_err() {
        debug!("Client disconnected before receiving connected event");
        return;
    }

    info!("WebSocket client connected");

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    // The first tick completes immediately.
    heartbeat.tick().await;
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Client closed the connection");
                        break;
                    }
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        debug!("Ignoring client message");
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!(error = %e, "Failed to serialize event");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "WebSocket client lagged, skipping events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!(missed_pongs, "Client stopped answering pings, closing");
                    break;
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

// ============================================================================
// Tests
// ============================================================================
