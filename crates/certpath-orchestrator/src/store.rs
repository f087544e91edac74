//! In-memory session storage keyed by learner.
//!
//! The map lock is held only long enough to find or insert an entry. Each
//! learner's session sits behind its own mutex, so operations for one learner
//! are serialized without blocking any other learner.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::session::Session;

/// Shared handle to one learner's session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Per-learner session records for the lifetime of the process.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session handle for `learner_id`, if enrolled.
    pub async fn get(&self, learner_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(learner_id).map(Arc::clone)
    }

    /// Installs `session` for `learner_id`, overwriting any previous one.
    ///
    /// An existing entry is locked before its contents are replaced, so any
    /// in-flight operation for the learner finishes first. The entry is
    /// returned still locked; later operations for the learner wait until
    /// the guard is dropped.
    pub async fn replace(&self, learner_id: &str, session: Session) -> OwnedMutexGuard<Session> {
        let mut sessions = self.sessions.write().await;
        let handle = match sessions.entry(learner_id.to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let handle = Arc::clone(entry.insert(Arc::new(Mutex::new(session))));
                // Fresh mutex, so this never waits.
                return handle.lock_owned().await;
            }
        };
        drop(sessions);

        let mut guard = handle.lock_owned().await;
        *guard = session;
        guard
    }

    /// Number of enrolled learners.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no learner is enrolled.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
