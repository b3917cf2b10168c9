use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tracking::SessionId;

/// Identity of a game launch control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(String);

impl ControlId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ControlId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ControlId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declaration of a launch control, as read from the page markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSpec {
    pub control_id: ControlId,
    pub video_id: String,
    /// Reported id; falls back to `video_id`.
    #[serde(default)]
    pub game_id: Option<String>,
    pub url: String,
    /// Raw required-seconds attribute; invalid or non-positive values use the default.
    #[serde(default)]
    pub seconds: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl GameSpec {
    pub fn new(control_id: impl Into<ControlId>, video_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            video_id: video_id.into(),
            game_id: None,
            url: url.into(),
            seconds: None,
            prompt: None,
        }
    }

    pub fn with_seconds(mut self, seconds: impl Into<String>) -> Self {
        self.seconds = Some(seconds.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    /// Parsed required duration, or `default_secs`.
    pub fn required_secs(&self, default_secs: u64) -> u64 {
        self.seconds
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(default_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Idle,
    /// Waiting on the start-confirmation dialog.
    Confirming,
    /// Countdown running; control disabled.
    Counting,
    /// Countdown hit zero, completion report in flight.
    Completing,
    Completed,
}

impl GamePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Confirming => "confirming",
            GamePhase::Counting => "counting",
            GamePhase::Completing => "completing",
            GamePhase::Completed => "completed",
        }
    }

    /// A new launch may begin.
    pub fn is_launchable(self) -> bool {
        matches!(self, GamePhase::Idle | GamePhase::Completed)
    }
}

/// Text shown next to a control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

impl StatusLine {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// One launch control and its countdown.
#[derive(Debug, Clone)]
pub struct GameControl {
    pub(crate) id: ControlId,
    pub(crate) game_id: String,
    pub(crate) url: String,
    pub(crate) prompt: String,
    pub(crate) required_secs: u64,
    pub(crate) phase: GamePhase,
    pub(crate) session: Option<SessionId>,
    pub(crate) started_at_ms: Option<u64>,
    pub(crate) remaining_secs: u64,
    pub(crate) attempt_logged: bool,
    pub(crate) status: StatusLine,
}

impl GameControl {
    pub(crate) fn new(spec: &GameSpec, default_secs: u64, default_prompt: &str) -> Self {
        let required_secs = spec.required_secs(default_secs);
        Self {
            id: spec.control_id.clone(),
            game_id: spec.game_id.clone().unwrap_or_else(|| spec.video_id.clone()),
            url: spec.url.clone(),
            prompt: spec
                .prompt
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| default_prompt.to_string()),
            required_secs,
            phase: GamePhase::Idle,
            session: None,
            started_at_ms: None,
            remaining_secs: required_secs,
            attempt_logged: false,
            status: StatusLine::default(),
        }
    }

    pub fn id(&self) -> &ControlId {
        &self.id
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn required_secs(&self) -> u64 {
        self.required_secs
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Control is disabled while its countdown runs.
    pub fn is_disabled(&self) -> bool {
        matches!(self.phase, GamePhase::Counting | GamePhase::Completing)
    }

    /// Clears the countdown and re-enables the control.
    pub(crate) fn clear_timer(&mut self, phase: GamePhase, status: StatusLine) {
        self.phase = phase;
        self.started_at_ms = None;
        self.remaining_secs = self.required_secs;
        self.status = status;
    }
}
