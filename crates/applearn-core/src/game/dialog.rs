//! Start-confirmation dialog.
//!
//! The dialog resolves exactly once. Accept, cancel, and dismiss are
//! separate outcomes even though only accept proceeds.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissReason {
    /// Click outside the dialog.
    Backdrop,
    Escape,
    /// The controls went away without an answer.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptOutcome {
    Accepted,
    Cancelled,
    Dismissed(DismissReason),
}

impl PromptOutcome {
    pub fn is_accepted(self) -> bool {
        self == PromptOutcome::Accepted
    }
}

/// Source of confirmation answers.
#[allow(async_fn_in_trait)]
pub trait Confirm {
    async fn confirm(&self, message: &str) -> PromptOutcome;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub PromptOutcome);

impl Confirm for AutoConfirm {
    async fn confirm(&self, _message: &str) -> PromptOutcome {
        self.0
    }
}

/// Opens a modal confirmation.
pub struct ConfirmDialog;

impl ConfirmDialog {
    /// Returns the user-facing controls and the pending answer.
    pub fn open(message: impl Into<String>) -> (DialogControls, DialogResponse) {
        let (tx, rx) = oneshot::channel();
        (
            DialogControls {
                message: message.into(),
                tx,
            },
            DialogResponse { rx },
        )
    }
}

/// The buttons of an open dialog. Each action consumes the controls, so a
/// dialog can only be answered once.
#[derive(Debug)]
pub struct DialogControls {
    message: String,
    tx: oneshot::Sender<PromptOutcome>,
}

impl DialogControls {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn accept(self) {
        self.resolve(PromptOutcome::Accepted);
    }

    pub fn cancel(self) {
        self.resolve(PromptOutcome::Cancelled);
    }

    pub fn dismiss(self, reason: DismissReason) {
        self.resolve(PromptOutcome::Dismissed(reason));
    }

    fn resolve(self, outcome: PromptOutcome) {
        // Receiver gone means nobody is waiting anymore.
        let _ = self.tx.send(outcome);
    }
}

#[derive(Debug)]
pub struct DialogResponse {
    rx: oneshot::Receiver<PromptOutcome>,
}

impl DialogResponse {
    pub async fn outcome(self) -> PromptOutcome {
        self.rx
            .await
            .unwrap_or(PromptOutcome::Dismissed(DismissReason::Closed))
    }
}
