//! Video engagement tracking.
//!
//! - [`session`]: playback session ids and when to mint them
//! - [`medium`]: per-element record
//! - [`accumulator`]: clamped playback-to-credit conversion
//! - [`reporter`]: turns accumulated time into reports
//! - [`video`]: the tracker that wires them to element and page events

pub mod accumulator;
pub mod medium;
pub mod reporter;
pub mod session;
pub mod video;

pub use accumulator::{Accumulator, FlushOptions};
pub use medium::{MediumId, PlaybackSample, TrackedMedium};
pub use reporter::ProgressReporter;
pub use session::{SessionId, SessionManager};
pub use video::VideoTracker;
