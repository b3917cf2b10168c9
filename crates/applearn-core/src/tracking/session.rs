//! Playback session identifiers.
//!
//! A session groups the reports of one continuous viewing of a medium. The
//! portal counts views by distinct session id, so a replay from the start
//! must get a fresh one.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::medium::TrackedMedium;

/// Opaque, collision-resistant session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides when a medium needs a new session.
#[derive(Debug, Clone)]
pub struct SessionManager {
    restart_threshold_secs: f64,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SessionManager {
    pub fn new(restart_threshold_secs: f64) -> Self {
        Self {
            restart_threshold_secs,
        }
    }

    /// Returns the medium's session, minting a new one when there is none,
    /// the previous one ended, or the playhead sits before the restart
    /// threshold. The flag is true when a new id was minted.
    pub fn ensure_session(&self, medium: &mut TrackedMedium) -> (SessionId, bool) {
        let restart = medium.position() < self.restart_threshold_secs;
        match medium.session.as_ref() {
            Some(id) if !medium.session_ended && !restart => (id.clone(), false),
            _ => {
                let id = SessionId::generate();
                medium.session = Some(id.clone());
                medium.session_ended = false;
                (id, true)
            }
        }
    }

    /// Marks the current session finished; the next play mints a new one.
    pub fn end_session(&self, medium: &mut TrackedMedium) -> Option<SessionId> {
        if medium.session_ended {
            return None;
        }
        medium.session_ended = true;
        medium.session.clone()
    }

    /// Drops the session outright (login lost).
    pub fn invalidate(&self, medium: &mut TrackedMedium) {
        medium.session = None;
        medium.session_ended = false;
    }
}
