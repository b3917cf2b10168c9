//! Timer-based tracking for external game links.
//!
//! Games run in another browsing context and cannot report progress, so the
//! page credits them with a countdown instead: the player must keep the page
//! open and visible for the control's required duration in one sitting.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Confirming -> Counting -> Completing -> Completed
//!           |              |
//!           v              v
//!          Idle           Idle   (cancel / popup blocked, or interruption)
//! ```
//!
//! `Completed` accepts a new launch just like `Idle`.

mod control;
mod dialog;
mod launcher;
mod tracker;

pub use control::{ControlId, GameControl, GamePhase, GameSpec, StatusLine};
pub use dialog::{AutoConfirm, Confirm, ConfirmDialog, DialogControls, DialogResponse, DismissReason, PromptOutcome};
pub use launcher::{SystemBrowser, WindowOpener};
pub use tracker::GameTracker;

pub const SIGN_IN_REQUIRED: &str = "Sign in to track this game.";
pub const LAUNCH_CANCELLED: &str = "Launch cancelled. Click Play Game when you are ready.";
pub const POPUP_BLOCKED: &str =
    "Pop-up blocked. Please allow pop-ups for AppLearn or open the link manually.";
pub const ATTEMPT_NOT_LOGGED: &str = "Attempt not logged. Timer running anyway.";
pub const MARKING_COMPLETE: &str = "Marking game complete...";
pub const GAME_COMPLETED: &str = "Game marked complete! Check the dashboard for updates.";
pub const COMPLETION_FAILED: &str = "Could not update progress. Try again after reloading.";

/// `m:ss`, rounding to the nearest second.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds.round().max(0.0) as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Live label while a countdown runs.
pub fn countdown_label(remaining_secs: u64, attempt_logged: bool) -> String {
    let base = if attempt_logged {
        "Tracking game time"
    } else {
        "Timer running (attempt not logged)"
    };
    format!("{base}: {} remaining", format_time(remaining_secs as f64))
}

/// Shown when an interruption cancels a countdown.
pub fn reset_message(required_secs: u64, remaining_secs: u64) -> String {
    format!(
        "Timer reset with {} remaining. You must complete the full {} in one session to receive credit.",
        format_time(remaining_secs as f64),
        format_time(required_secs as f64)
    )
}
