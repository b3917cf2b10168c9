//! Registry of game controls and their countdowns.
//!
//! Like the video tracker this is sans-IO: each step either changes a
//! control's phase or hands back a report for the caller to deliver. The
//! countdown is wall-clock based; the caller drives it with `tick()`.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::api::ProgressReport;
use crate::error::GameError;
use crate::events::Event;
use crate::storage::GameConfig;
use crate::tracking::SessionId;

use super::control::{ControlId, GameControl, GamePhase, GameSpec, StatusLine};
use super::{
    countdown_label, reset_message, ATTEMPT_NOT_LOGGED, COMPLETION_FAILED, GAME_COMPLETED,
    LAUNCH_CANCELLED, MARKING_COMPLETE, POPUP_BLOCKED, SIGN_IN_REQUIRED,
};

#[derive(Debug)]
pub struct GameTracker {
    controls: BTreeMap<ControlId, GameControl>,
    default_secs: u64,
    default_prompt: String,
    events: Vec<Event>,
}

impl Default for GameTracker {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

impl GameTracker {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            controls: BTreeMap::new(),
            default_secs: config.default_seconds.max(1),
            default_prompt: config.default_prompt.clone(),
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn control(&self, id: &ControlId) -> Option<&GameControl> {
        self.controls.get(id)
    }

    pub fn controls(&self) -> impl Iterator<Item = &GameControl> {
        self.controls.values()
    }

    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Launch steps ─────────────────────────────────────────────────

    /// Adds a control. Re-registering an idle control replaces it.
    pub fn register(&mut self, spec: &GameSpec) -> Result<(), GameError> {
        if let Some(existing) = self.controls.get(&spec.control_id) {
            if !existing.phase.is_launchable() {
                return Err(GameError::Busy(spec.control_id.to_string()));
            }
        }
        let control = GameControl::new(spec, self.default_secs, &self.default_prompt);
        self.controls.insert(spec.control_id.clone(), control);
        Ok(())
    }

    /// Anonymous visitor clicked the control.
    pub fn deny_anonymous(&mut self, id: &ControlId) -> Result<(), GameError> {
        let control = Self::lookup(&mut self.controls, id)?;
        control.status = StatusLine::error(SIGN_IN_REQUIRED);
        self.events.push(status_event(control));
        Ok(())
    }

    /// Opens the confirmation step. Returns the prompt to show.
    pub fn begin(&mut self, id: &ControlId) -> Result<String, GameError> {
        let control = Self::lookup(&mut self.controls, id)?;
        if !control.phase.is_launchable() {
            return Err(GameError::Busy(id.to_string()));
        }
        control.phase = GamePhase::Confirming;
        Ok(control.prompt.clone())
    }

    /// Confirmation declined or dismissed.
    pub fn cancel(&mut self, id: &ControlId) -> Result<(), GameError> {
        let control = Self::confirming(&mut self.controls, id, "cancel")?;
        control.clear_timer(GamePhase::Idle, StatusLine::info(LAUNCH_CANCELLED));
        self.events.push(status_event(control));
        Ok(())
    }

    /// The window could not be opened; nothing is reported.
    pub fn popup_blocked(&mut self, id: &ControlId) -> Result<(), GameError> {
        let control = Self::confirming(&mut self.controls, id, "popup_blocked")?;
        control.clear_timer(GamePhase::Idle, StatusLine::info(POPUP_BLOCKED));
        self.events.push(status_event(control));
        Ok(())
    }

    /// Window opened: mint the game session and build the attempt report.
    pub fn attempt(&mut self, id: &ControlId) -> Result<ProgressReport, GameError> {
        let control = Self::confirming(&mut self.controls, id, "attempt")?;
        let session = SessionId::generate();
        let report = ProgressReport::attempt(control.game_id.clone(), session.to_string());
        control.session = Some(session);
        Ok(report)
    }

    /// Starts the countdown once the attempt post has settled.
    pub fn start_countdown(
        &mut self,
        id: &ControlId,
        now_ms: u64,
        attempt_logged: bool,
    ) -> Result<(), GameError> {
        let control = Self::confirming(&mut self.controls, id, "start_countdown")?;
        let Some(session) = control.session.clone() else {
            return Err(GameError::InvalidPhase {
                control: id.to_string(),
                action: "start_countdown",
                phase: "no session",
            });
        };

        control.phase = GamePhase::Counting;
        control.started_at_ms = Some(now_ms);
        control.remaining_secs = control.required_secs;
        control.attempt_logged = attempt_logged;
        control.status = if attempt_logged {
            StatusLine::info(countdown_label(control.required_secs, true))
        } else {
            StatusLine::error(ATTEMPT_NOT_LOGGED)
        };

        tracing::info!(
            control = %id,
            game_id = %control.game_id,
            required_secs = control.required_secs,
            attempt_logged,
            "game countdown started"
        );
        self.events.push(Event::GameLaunched {
            control_id: id.to_string(),
            game_id: control.game_id.clone(),
            session_id: session.to_string(),
            required_secs: control.required_secs,
            attempt_logged,
            at: Utc::now(),
        });
        self.events.push(status_event(control));
        Ok(())
    }

    /// Advances every running countdown. Returns completion reports for the
    /// ones that reached their required duration.
    pub fn tick(&mut self, now_ms: u64) -> Vec<(ControlId, ProgressReport)> {
        let mut due = Vec::new();
        for control in self.controls.values_mut() {
            if control.phase != GamePhase::Counting {
                continue;
            }
            let Some(started) = control.started_at_ms else { continue };
            let elapsed_ms = now_ms.saturating_sub(started);
            let remaining = control.required_secs.saturating_sub(elapsed_ms / 1000);

            if elapsed_ms >= control.required_secs * 1000 {
                let Some(session) = control.session.as_ref() else { continue };
                let report = ProgressReport::game_completion(
                    control.game_id.clone(),
                    session.to_string(),
                    control.required_secs,
                );
                control.phase = GamePhase::Completing;
                control.remaining_secs = 0;
                control.status = StatusLine::info(MARKING_COMPLETE);
                self.events.push(status_event(control));
                due.push((control.id.clone(), report));
                continue;
            }

            if remaining != control.remaining_secs {
                control.remaining_secs = remaining;
                control.status = StatusLine::info(countdown_label(remaining, control.attempt_logged));
                self.events.push(status_event(control));
            }
        }
        due
    }

    /// Completion report settled. Re-enables the control either way.
    pub fn finish(&mut self, id: &ControlId, credited: bool) -> Result<(), GameError> {
        let control = Self::lookup(&mut self.controls, id)?;
        if control.phase != GamePhase::Completing {
            return Err(GameError::InvalidPhase {
                control: id.to_string(),
                action: "finish",
                phase: control.phase.as_str(),
            });
        }
        let status = if credited {
            StatusLine::info(GAME_COMPLETED)
        } else {
            StatusLine::error(COMPLETION_FAILED)
        };
        let (next, seconds) = if credited {
            (GamePhase::Completed, control.required_secs)
        } else {
            (GamePhase::Idle, 0)
        };
        control.clear_timer(next, status);

        tracing::info!(control = %id, credited, "game countdown finished");
        self.events.push(Event::GameCompleted {
            control_id: id.to_string(),
            game_id: control.game_id.clone(),
            seconds,
            credited,
            at: Utc::now(),
        });
        self.events.push(status_event(control));
        Ok(())
    }

    // ── Interruptions ────────────────────────────────────────────────

    /// Cancels every running countdown. No partial credit; each control
    /// goes back to idle with the one-sitting reminder.
    pub fn reset_all(&mut self) -> Vec<ControlId> {
        let mut reset = Vec::new();
        for control in self.controls.values_mut() {
            if control.phase != GamePhase::Counting {
                continue;
            }
            let remaining = control.remaining_secs;
            let required = control.required_secs;
            control.clear_timer(
                GamePhase::Idle,
                StatusLine::info(reset_message(required, remaining)),
            );
            control.session = None;

            tracing::info!(control = %control.id, remaining, "game countdown reset");
            self.events.push(Event::GameReset {
                control_id: control.id.to_string(),
                remaining_secs: remaining,
                required_secs: required,
                at: Utc::now(),
            });
            self.events.push(status_event(control));
            reset.push(control.id.clone());
        }
        reset
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lookup<'a>(
        controls: &'a mut BTreeMap<ControlId, GameControl>,
        id: &ControlId,
    ) -> Result<&'a mut GameControl, GameError> {
        controls
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownControl(id.to_string()))
    }

    fn confirming<'a>(
        controls: &'a mut BTreeMap<ControlId, GameControl>,
        id: &ControlId,
        action: &'static str,
    ) -> Result<&'a mut GameControl, GameError> {
        let control = Self::lookup(controls, id)?;
        if control.phase != GamePhase::Confirming {
            return Err(GameError::InvalidPhase {
                control: id.to_string(),
                action,
                phase: control.phase.as_str(),
            });
        }
        Ok(control)
    }
}

fn status_event(control: &GameControl) -> Event {
    Event::GameStatus {
        control_id: control.id.to_string(),
        message: control.status.message.clone(),
        is_error: control.status.is_error,
        at: Utc::now(),
    }
}
