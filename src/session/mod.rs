//! Session state management
//!
//! A session is one end-to-end attempt at producing a video, from photo
//! selection through completion or failure. The session owns all state the
//! workflow steps read and mutate, and notifies observers of changes so a
//! presentation layer can react without the core knowing about it.

pub mod events;
pub mod state;

pub use events::{SessionEvent, SessionObserver};
pub use state::{Session, StatusSnapshot, Step, MAX_PHOTOS, MIN_NARRATIVE_CHARS, MIN_PHOTOS};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one attempt, used for log correlation.
///
/// A reset session gets a fresh identifier; stale ones never carry over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("session-{}", Uuid::new_v4()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
