use serde::{Deserialize, Serialize};

use crate::api::{MeResponse, PortalApi};

/// Where the page navigates after logging out.
pub const LOGOUT_REDIRECT: &str = "Home.html";

/// What the account area of the header shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub welcome: String,
    /// Capitalized role badge; empty when logged out.
    pub role: String,
    pub show_login: bool,
    pub show_signup: bool,
    pub show_logout: bool,
}

impl AccountView {
    pub fn logged_in(first_name: Option<&str>, role: Option<&str>) -> Self {
        let welcome = match first_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => format!("Welcome, {name}!"),
            None => "Welcome!".to_string(),
        };
        Self {
            welcome,
            role: role.map(format_role).unwrap_or_default(),
            show_login: false,
            show_signup: false,
            show_logout: true,
        }
    }

    pub fn logged_out() -> Self {
        Self {
            welcome: String::new(),
            role: String::new(),
            show_login: true,
            show_signup: true,
            show_logout: false,
        }
    }

    pub fn from_me(me: &MeResponse) -> Self {
        if me.authenticated {
            Self::logged_in(me.first_name.as_deref(), me.role.as_deref())
        } else {
            Self::logged_out()
        }
    }
}

/// `student` -> `Student`.
pub fn format_role(role: &str) -> String {
    let role = role.trim();
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub view: AccountView,
    pub redirect: &'static str,
    /// Portal acknowledged the logout. Callers proceed either way.
    pub acknowledged: bool,
}

/// Logs out and always lands on the logged-out view, whatever the portal
/// answered.
pub async fn logout<A: PortalApi>(api: &A) -> LogoutOutcome {
    let acknowledged = match api.logout().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "logout request failed");
            false
        }
    };
    LogoutOutcome {
        view: AccountView::logged_out(),
        redirect: LOGOUT_REDIRECT,
        acknowledged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_uses_first_name() {
        let view = AccountView::logged_in(Some("Grace"), Some("teacher"));
        assert_eq!(view.welcome, "Welcome, Grace!");
        assert_eq!(view.role, "Teacher");
        assert!(view.show_logout);
        assert!(!view.show_login && !view.show_signup);
    }

    #[test]
    fn welcome_without_name() {
        let view = AccountView::logged_in(Some("  "), None);
        assert_eq!(view.welcome, "Welcome!");
        assert_eq!(view.role, "");
    }

    #[test]
    fn format_role_capitalizes_first_letter() {
        assert_eq!(format_role("student"), "Student");
        assert_eq!(format_role("éditeur"), "Éditeur");
        assert_eq!(format_role(""), "");
    }

    #[test]
    fn logged_out_shows_login_and_signup() {
        let view = AccountView::logged_out();
        assert!(view.show_login && view.show_signup);
        assert!(!view.show_logout);
        assert_eq!(view, AccountView::from_me(&MeResponse::default()));
    }
}
