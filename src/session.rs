//! Typed per-session scratch storage.
//!
//! A process-wide map from session id to whatever in-progress state a
//! conversational flow needs. The step and its payload live in one value of
//! type `T`, so clearing a session can never leave a dangling half of the
//! state behind. The store is passed by reference into whichever component
//! drives the conversation; there is no ambient global.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Identifier of one chat session
pub type SessionId = i64;

/// Shared, clonable scratch store keyed by session id
#[derive(Debug)]
pub struct SessionStore<T> {
    sessions: Arc<RwLock<HashMap<SessionId, T>>>,
}

impl<T> SessionStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace the scratch state for a session
    pub fn set(&self, session: SessionId, value: T) {
        self.sessions.write().unwrap().insert(session, value);
    }

    /// Remove and return a session's scratch state
    pub fn take(&self, session: SessionId) -> Option<T> {
        self.sessions.write().unwrap().remove(&session)
    }

    /// Discard a session's scratch state, if any
    pub fn clear(&self, session: SessionId) {
        self.sessions.write().unwrap().remove(&session);
    }

    /// Whether a session has in-progress state
    pub fn is_active(&self, session: SessionId) -> bool {
        self.sessions.read().unwrap().contains_key(&session)
    }
}

impl<T: Clone> SessionStore<T> {
    /// Get a copy of a session's scratch state
    pub fn get(&self, session: SessionId) -> Option<T> {
        self.sessions.read().unwrap().get(&session).cloned()
    }
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SessionStore<T> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}
