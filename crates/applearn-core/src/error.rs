//! Core error types for applearn-core.
//!
//! Tracking failures are local and non-fatal: most of them surface as a
//! status line or a `tracing` warning instead of propagating. The types here
//! cover the places where a caller does need to branch on what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for applearn-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Portal API errors
    #[error("Portal API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Game launch control errors
    #[error("Game control error: {0}")]
    Game(#[from] GameError),
}

/// Errors talking to the portal backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Portal answered 401 -- the login session is gone
    #[error("Not authenticated")]
    Unauthorized,

    /// Portal answered with another non-success status
    #[error("Request to {endpoint} failed with status {status}")]
    Status { endpoint: String, status: u16 },

    /// Response body did not match the expected shape
    #[error("Invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Base URL could not be joined with an endpoint path
    #[error("Invalid portal URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home/config directory could not be prepared
    #[error("Config directory unavailable: {0}")]
    DataDir(String),
}

/// Game launch control errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// No control registered under this id
    #[error("Unknown game control: {0}")]
    UnknownControl(String),

    /// Control is already confirming or counting down
    #[error("Game control '{0}' is busy")]
    Busy(String),

    /// Transition not allowed from the control's current phase
    #[error("Game control '{control}' cannot {action} while {phase}")]
    InvalidPhase {
        control: String,
        action: &'static str,
        phase: &'static str,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            let endpoint = err
                .url()
                .map(|u| u.path().to_string())
                .unwrap_or_default();
            ApiError::Decode {
                endpoint,
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
