//! # AppLearn Core Library
//!
//! Client-side engagement tracking for the AppLearn learning portal. The
//! library decides how much watch time and game time a signed-in learner
//! has earned and reports it to the portal; the host (a browser shim, the
//! CLI, or tests) feeds it element and page events.
//!
//! ## Architecture
//!
//! - **Auth Gate**: resolves who-am-I once per page and fails closed
//! - **Video Tracking**: per-element sessions, a clamped time accumulator,
//!   and a reporter that flushes on threshold, pause, end, and visibility loss
//! - **Game Tracking**: confirmation, detached launch, and an uninterrupted
//!   countdown per launch control
//! - **Page**: owns the above and delivers reports through a [`PortalApi`]
//!
//! The trackers are wall-clock state machines without threads. The caller
//! supplies the time through a [`Clock`] and drives periodic ticks.
//!
//! ## Key Components
//!
//! - [`Page`]: one page lifetime, the entry point for hosts
//! - [`VideoTracker`]: video engagement state machine
//! - [`GameTracker`]: registry of game countdowns
//! - [`HttpPortalApi`]: `reqwest` implementation of [`PortalApi`]
//! - [`Config`]: TOML configuration

pub mod api;
pub mod auth;
pub mod clock;
pub mod error;
pub mod events;
pub mod game;
pub mod page;
pub mod storage;
pub mod tracking;

pub use api::{HttpPortalApi, MeResponse, PortalApi, ProgressReport};
pub use auth::{AccountView, AuthGate, AuthState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ApiError, ConfigError, CoreError, GameError};
pub use events::Event;
pub use game::{ControlId, GameSpec, GameTracker, PromptOutcome};
pub use page::{LaunchOutcome, LaunchStep, Page, PageSignal};
pub use storage::Config;
pub use tracking::{MediumId, PlaybackSample, SessionId, VideoTracker};
