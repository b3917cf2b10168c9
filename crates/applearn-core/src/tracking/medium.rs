//! Per-element tracking records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::session::SessionId;

/// Identity of a tracked media element (the portal's `video_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediumId(String);

impl MediumId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediumId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MediumId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for MediumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reading of an element's playback clock at the moment of an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    /// Playhead, seconds.
    pub position: f64,
    /// Natural duration, seconds (0 when unknown).
    pub duration: f64,
    pub paused: bool,
    pub ended: bool,
}

impl PlaybackSample {
    pub fn playing(position: f64, duration: f64) -> Self {
        Self {
            position,
            duration,
            paused: false,
            ended: false,
        }
    }

    pub fn paused(position: f64, duration: f64) -> Self {
        Self {
            paused: true,
            ..Self::playing(position, duration)
        }
    }

    pub fn ended(duration: f64) -> Self {
        Self {
            position: duration,
            duration,
            paused: true,
            ended: true,
        }
    }
}

/// Tracking state of one video element, owned by the video tracker.
#[derive(Debug, Clone)]
pub struct TrackedMedium {
    id: MediumId,
    duration: f64,
    position: f64,
    paused: bool,
    ended: bool,
    pub(crate) in_view: bool,
    /// Credited seconds not yet reported.
    pub(crate) accumulated_secs: f64,
    pub(crate) session: Option<SessionId>,
    pub(crate) session_ended: bool,
    /// Position at the previous accumulator sample.
    pub(crate) last_position: f64,
    /// Wall clock at the previous accumulator sample.
    pub(crate) last_wall_ms: u64,
    /// Wall clock of the last `play`; bounds total credit for the run.
    pub(crate) run_started_ms: u64,
    pub(crate) run_credited_secs: f64,
    /// Periodic tick is armed.
    pub(crate) ticking: bool,
    /// Next sample only establishes the baseline (re-armed after a gap).
    pub(crate) baseline_pending: bool,
}

impl TrackedMedium {
    pub fn new(id: MediumId, duration: f64) -> Self {
        Self {
            id,
            duration: duration.max(0.0),
            position: 0.0,
            paused: true,
            ended: false,
            in_view: false,
            accumulated_secs: 0.0,
            session: None,
            session_ended: false,
            last_position: 0.0,
            last_wall_ms: 0,
            run_started_ms: 0,
            run_credited_secs: 0.0,
            ticking: false,
            baseline_pending: false,
        }
    }

    pub fn id(&self) -> &MediumId {
        &self.id
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_in_view(&self) -> bool {
        self.in_view
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Playing from the element's point of view, regardless of page state.
    pub fn is_playing(&self) -> bool {
        !self.paused && !self.ended
    }

    /// The element clock as last observed.
    pub fn last_sample(&self) -> PlaybackSample {
        PlaybackSample {
            position: self.position,
            duration: self.duration,
            paused: self.paused,
            ended: self.ended,
        }
    }

    /// Copies the element clock into the record.
    pub fn observe(&mut self, sample: &PlaybackSample) {
        if sample.position.is_finite() {
            self.position = sample.position.max(0.0);
        }
        if sample.duration.is_finite() && sample.duration > 0.0 {
            self.duration = sample.duration;
        }
        self.paused = sample.paused;
        self.ended = sample.ended;
    }

    /// Removes and returns the unreported seconds.
    pub(crate) fn take_accumulated(&mut self) -> f64 {
        std::mem::take(&mut self.accumulated_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_ignores_unknown_duration() {
        let mut m = TrackedMedium::new(MediumId::from("v"), 90.0);
        m.observe(&PlaybackSample::playing(12.0, f64::NAN));
        assert_eq!(m.duration(), 90.0);
        assert_eq!(m.position(), 12.0);
        assert!(m.is_playing());
    }

    #[test]
    fn take_accumulated_zeroes() {
        let mut m = TrackedMedium::new(MediumId::from("v"), 90.0);
        m.accumulated_secs = 4.5;
        assert_eq!(m.take_accumulated(), 4.5);
        assert_eq!(m.accumulated_secs(), 0.0);
    }
}
