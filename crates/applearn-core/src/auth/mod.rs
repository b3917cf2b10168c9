//! Login state as seen by the page.
//!
//! The who-am-I check runs at most once per page lifetime. Every failure
//! (network, non-2xx, unreadable body) resolves to anonymous, and tracking
//! stays off. A 401 on a later report downgrades the state for good.

mod account;

pub use account::{format_role, logout, AccountView, LogoutOutcome, LOGOUT_REDIRECT};

use serde::{Deserialize, Serialize};

use crate::api::{MeResponse, PortalApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// Check not run yet.
    Unknown,
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    state: AuthState,
    profile: Option<MeResponse>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGate {
    pub fn new() -> Self {
        Self {
            state: AuthState::Unknown,
            profile: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// Profile returned by the successful check, if any.
    pub fn profile(&self) -> Option<&MeResponse> {
        self.profile.as_ref()
    }

    /// Resolves the login state on first use and caches it. Later calls
    /// return the cached answer without touching the network.
    pub async fn check_authenticated<A: PortalApi>(&mut self, api: &A) -> bool {
        if self.state != AuthState::Unknown {
            return self.is_authenticated();
        }

        match api.fetch_me().await {
            Ok(me) if me.authenticated => {
                tracing::debug!(first_name = ?me.first_name, "authenticated");
                self.state = AuthState::Authenticated;
                self.profile = Some(me);
            }
            Ok(_) => {
                tracing::debug!("anonymous visitor");
                self.state = AuthState::Anonymous;
            }
            Err(e) => {
                tracing::debug!(error = %e, "auth check failed, treating as anonymous");
                self.state = AuthState::Anonymous;
            }
        }
        self.is_authenticated()
    }

    /// Login is gone (401 or logout). Nothing is sent again until a reload.
    pub fn invalidate(&mut self) {
        if self.state != AuthState::Anonymous {
            tracing::info!("login invalidated");
        }
        self.state = AuthState::Anonymous;
        self.profile = None;
    }

    /// Header view for the current state.
    pub fn account_view(&self) -> AccountView {
        match (&self.state, &self.profile) {
            (AuthState::Authenticated, Some(me)) => AccountView::from_me(me),
            _ => AccountView::logged_out(),
        }
    }
}
