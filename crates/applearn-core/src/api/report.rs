//! Progress report wire format.
//!
//! Mirrors the body of `POST /api/video/progress`. The portal reads the
//! `completed`/`started`/`attempt` flags as integers, so they serialize as
//! `1`/`0` and are omitted entirely when unset.

use serde::{Deserialize, Serialize};

/// One outbound progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub video_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Credited seconds since the previous report for this medium.
    pub seconds_delta: f64,
    /// Playback position, whole seconds.
    pub position: u64,
    /// Natural or required duration, whole seconds.
    pub duration: u64,
    #[serde(default, with = "flag", skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, with = "flag", skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,
    #[serde(default, with = "flag", skip_serializing_if = "Option::is_none")]
    pub attempt: Option<bool>,
}

impl ProgressReport {
    /// Empty report for `video_id`: no time, no flags.
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            session_id: None,
            seconds_delta: 0.0,
            position: 0,
            duration: 0,
            completed: None,
            started: None,
            attempt: None,
        }
    }

    /// Game launch: counts an attempt, credits nothing.
    pub fn attempt(game_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            attempt: Some(true),
            ..Self::new(game_id)
        }
    }

    /// Game countdown finished: the whole required duration is credited at once.
    pub fn game_completion(
        game_id: impl Into<String>,
        session_id: impl Into<String>,
        seconds: u64,
    ) -> Self {
        Self {
            session_id: Some(session_id.into()),
            seconds_delta: seconds as f64,
            position: seconds,
            duration: seconds,
            completed: Some(true),
            ..Self::new(game_id)
        }
    }

    pub fn is_completion(&self) -> bool {
        self.completed == Some(true)
    }

    pub fn is_attempt(&self) -> bool {
        self.attempt == Some(true)
    }

    pub fn is_started(&self) -> bool {
        self.started == Some(true)
    }
}

/// Rounds a playback clock value to the whole seconds the portal stores.
pub(crate) fn whole_seconds(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }

    pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_u8(u8::from(*v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(raw.map(|r| match r {
            Raw::Bool(b) => b,
            Raw::Int(i) => i != 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attempt_report_matches_portal_shape() {
        let report = ProgressReport::attempt("game-1", "s-1");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "video_id": "game-1",
                "session_id": "s-1",
                "seconds_delta": 0.0,
                "position": 0,
                "duration": 0,
                "attempt": 1,
            })
        );
    }

    #[test]
    fn unset_flags_and_session_are_omitted() {
        let value = serde_json::to_value(ProgressReport::new("v")).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("session_id"));
        assert!(!obj.contains_key("completed"));
        assert!(!obj.contains_key("started"));
        assert!(!obj.contains_key("attempt"));
    }

    #[test]
    fn explicit_false_flag_serializes_as_zero() {
        let report = ProgressReport {
            completed: Some(false),
            ..ProgressReport::new("v")
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["completed"], json!(0));
    }

    #[test]
    fn flags_parse_from_ints_or_bools() {
        let report: ProgressReport = serde_json::from_value(json!({
            "video_id": "v",
            "seconds_delta": 3.5,
            "position": 4,
            "duration": 60,
            "completed": true,
            "started": 0,
        }))
        .unwrap();
        assert_eq!(report.completed, Some(true));
        assert_eq!(report.started, Some(false));
        assert_eq!(report.attempt, None);
    }

    #[test]
    fn whole_seconds_rounds_and_clamps() {
        assert_eq!(whole_seconds(12.6), 13);
        assert_eq!(whole_seconds(-3.0), 0);
        assert_eq!(whole_seconds(f64::NAN), 0);
    }
}
