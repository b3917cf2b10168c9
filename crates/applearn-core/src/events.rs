use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every tracker transition produces an Event.
/// The host drains them from the page; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AuthResolved {
        authenticated: bool,
        at: DateTime<Utc>,
    },
    /// A report came back 401; nothing more is sent from this page.
    AuthLost {
        at: DateTime<Utc>,
    },
    SessionStarted {
        video_id: String,
        session_id: String,
        at: DateTime<Utc>,
    },
    SessionEnded {
        video_id: String,
        session_id: String,
        at: DateTime<Utc>,
    },
    ProgressSent {
        video_id: String,
        session_id: Option<String>,
        seconds_delta: f64,
        position: u64,
        completed: bool,
        at: DateTime<Utc>,
    },
    ProgressFailed {
        video_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// Unload-time report handed to the one-way transport.
    BeaconQueued {
        video_id: String,
        seconds_delta: f64,
        at: DateTime<Utc>,
    },
    /// Status line shown next to a game control changed.
    GameStatus {
        control_id: String,
        message: String,
        is_error: bool,
        at: DateTime<Utc>,
    },
    GameLaunched {
        control_id: String,
        game_id: String,
        session_id: String,
        required_secs: u64,
        attempt_logged: bool,
        at: DateTime<Utc>,
    },
    GameCompleted {
        control_id: String,
        game_id: String,
        seconds: u64,
        credited: bool,
        at: DateTime<Utc>,
    },
    /// Countdown cancelled by a page lifecycle interruption.
    GameReset {
        control_id: String,
        remaining_secs: u64,
        required_secs: u64,
        at: DateTime<Utc>,
    },
}
