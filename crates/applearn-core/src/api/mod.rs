//! Portal backend API.
//!
//! Three endpoints are consumed:
//!
//! | Method | Path                  | Notes                                   |
//! |--------|-----------------------|-----------------------------------------|
//! | GET    | `/api/me`             | who-am-I; anything but 2xx is anonymous |
//! | POST   | `/api/logout`         | outcome ignored by callers              |
//! | POST   | `/api/video/progress` | 2xx ok, 401 means the login is gone     |

mod http;
mod report;

pub use http::HttpPortalApi;
pub use report::ProgressReport;
pub(crate) use report::whole_seconds;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const ME_PATH: &str = "/api/me";
pub const LOGOUT_PATH: &str = "/api/logout";
pub const PROGRESS_PATH: &str = "/api/video/progress";

/// Body of `GET /api/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Everything the trackers need from the portal.
///
/// `send_beacon` is the unload-time path: it must not block and has no
/// result. Implementations make one best-effort delivery attempt.
#[allow(async_fn_in_trait)]
pub trait PortalApi {
    async fn fetch_me(&self) -> Result<MeResponse, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    async fn post_progress(&self, report: &ProgressReport) -> Result<(), ApiError>;

    fn send_beacon(&self, report: &ProgressReport);
}

/// Maps an HTTP status onto the portal's success/401/failure split.
pub fn check_status(endpoint: &str, status: u16) -> Result<(), ApiError> {
    match status {
        200..=299 => Ok(()),
        401 => Err(ApiError::Unauthorized),
        _ => Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_status_classifies() {
        assert!(check_status(PROGRESS_PATH, 204).is_ok());
        assert!(matches!(
            check_status(PROGRESS_PATH, 401),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            check_status(PROGRESS_PATH, 503),
            Err(ApiError::Status { status: 503, .. })
        ));
    }

    #[test]
    fn me_response_tolerates_missing_fields() {
        let me: MeResponse = serde_json::from_str(r#"{"authenticated": true}"#).unwrap();
        assert!(me.authenticated);
        assert_eq!(me.first_name, None);

        let anon: MeResponse = serde_json::from_str("{}").unwrap();
        assert!(!anon.authenticated);
    }
}
