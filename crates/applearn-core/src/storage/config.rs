//! TOML-based tracker configuration.
//!
//! Stores:
//! - Portal connection settings (base URL, timeouts, session cookie)
//! - Video accumulator tuning (tick period, flush threshold, seek slack)
//! - Game countdown defaults
//!
//! Configuration is stored at `~/.config/applearn/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Portal connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long teardown waits for unload beacons.
    #[serde(default = "default_beacon_timeout_ms")]
    pub beacon_timeout_ms: u64,
    /// Raw `Cookie` header carrying the portal login (e.g. `session=...`).
    #[serde(default)]
    pub session_cookie: Option<String>,
}

/// Video accumulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Accumulated seconds that trigger a regular (unforced) flush.
    #[serde(default = "default_flush_threshold_secs")]
    pub flush_threshold_secs: f64,
    /// Extra seconds of playhead movement tolerated beyond wall-clock time.
    #[serde(default = "default_seek_slack_secs")]
    pub seek_slack_secs: f64,
    /// Minimum intersection ratio for a video to count as in view.
    #[serde(default = "default_visibility_ratio")]
    pub visibility_ratio: f64,
    /// Positions below this on play are treated as a restart.
    #[serde(default = "default_restart_threshold_secs")]
    pub restart_threshold_secs: f64,
}

/// Game countdown configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_game_seconds")]
    pub default_seconds: u64,
    #[serde(default = "default_game_prompt")]
    pub default_prompt: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/applearn/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub game: GameConfig,
}

// Default functions
fn default_base_url() -> String {
    "http://localhost:5000".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_beacon_timeout_ms() -> u64 {
    2_000
}
fn default_tick_interval_ms() -> u64 {
    1_000
}
fn default_flush_threshold_secs() -> f64 {
    10.0
}
fn default_seek_slack_secs() -> f64 {
    0.25
}
fn default_visibility_ratio() -> f64 {
    0.5
}
fn default_restart_threshold_secs() -> f64 {
    1.0
}
fn default_game_seconds() -> u64 {
    10
}
fn default_game_prompt() -> String {
    "Please keep the game open and active for 5 minutes to receive credit. Ready to start?".into()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            beacon_timeout_ms: default_beacon_timeout_ms(),
            session_cookie: None,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            flush_threshold_secs: default_flush_threshold_secs(),
            seek_slack_secs: default_seek_slack_secs(),
            visibility_ratio: default_visibility_ratio(),
            restart_threshold_secs: default_restart_threshold_secs(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_seconds: default_game_seconds(),
            default_prompt: default_game_prompt(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        value
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    }
                }
                // Optional strings (session_cookie) start out as null.
                serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the existing field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Rejects values the trackers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if url::Url::parse(&self.portal.base_url).is_err() {
            return invalid("portal.base_url", "must be an absolute URL");
        }
        if self.portal.request_timeout_secs == 0 {
            return invalid("portal.request_timeout_secs", "must be positive");
        }
        if self.video.tick_interval_ms == 0 {
            return invalid("video.tick_interval_ms", "must be positive");
        }
        if !(self.video.flush_threshold_secs > 0.0) {
            return invalid("video.flush_threshold_secs", "must be positive");
        }
        if !(self.video.seek_slack_secs >= 0.0) {
            return invalid("video.seek_slack_secs", "must not be negative");
        }
        if !(0.0..=1.0).contains(&self.video.visibility_ratio) {
            return invalid("video.visibility_ratio", "must be between 0 and 1");
        }
        if !(self.video.restart_threshold_secs.is_finite() && self.video.restart_threshold_secs >= 0.0) {
            return invalid("video.restart_threshold_secs", "must be a finite, non-negative number");
        }
        if self.game.default_seconds == 0 {
            return invalid("game.default_seconds", "must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.video, cfg.video);
        assert_eq!(parsed.game.default_seconds, 10);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [portal]
            base_url = "https://learn.example.org"

            [video]
            flush_threshold_secs = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(parsed.portal.base_url, "https://learn.example.org");
        assert_eq!(parsed.portal.request_timeout_secs, 10);
        assert_eq!(parsed.video.flush_threshold_secs, 5.0);
        assert_eq!(parsed.video.seek_slack_secs, 0.25);
        assert_eq!(parsed.game, GameConfig::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("game.default_seconds").as_deref(), Some("10"));
        assert_eq!(cfg.get("video.visibility_ratio").as_deref(), Some("0.5"));
        assert_eq!(
            cfg.get("portal.base_url").as_deref(),
            Some("http://localhost:5000")
        );
        assert!(cfg.get("video.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("video.flush_threshold_secs", "7.5").unwrap();
        assert_eq!(cfg.video.flush_threshold_secs, 7.5);
        cfg.set("game.default_seconds", "300").unwrap();
        assert_eq!(cfg.game.default_seconds, 300);
    }

    #[test]
    fn set_fills_optional_string() {
        let mut cfg = Config::default();
        cfg.set("portal.session_cookie", "session=xyz").unwrap();
        assert_eq!(cfg.portal.session_cookie.as_deref(), Some("session=xyz"));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("video.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_number() {
        let mut cfg = Config::default();
        assert!(cfg.set("video.tick_interval_ms", "soon").is_err());
    }

    #[test]
    fn set_rejects_out_of_range_value_and_keeps_old() {
        let mut cfg = Config::default();
        assert!(cfg.set("video.visibility_ratio", "1.5").is_err());
        assert_eq!(cfg.video.visibility_ratio, 0.5);
    }

    #[test]
    fn set_rejects_bad_restart_threshold_and_timeout() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("video.restart_threshold_secs", "-1"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("portal.request_timeout_secs", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("portal.base_url", "not a url").is_err());
        assert_eq!(cfg.video.restart_threshold_secs, 1.0);
        assert_eq!(cfg.portal.request_timeout_secs, 10);
        cfg.set("video.restart_threshold_secs", "0").unwrap();
        assert_eq!(cfg.video.restart_threshold_secs, 0.0);
    }

    #[test]
    fn validate_rejects_nan_restart_threshold() {
        let mut cfg = Config::default();
        cfg.video.restart_threshold_secs = f64::NAN;
        assert!(cfg.validate().is_err());
        cfg.video.restart_threshold_secs = f64::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[video]\nrestart_threshold_secs = nan\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.game.default_seconds, 10);
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("portal.base_url", "https://portal.test").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.portal.base_url, "https://portal.test");
    }

    #[test]
    fn load_from_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "video = [not toml").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
