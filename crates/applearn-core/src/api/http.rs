//! reqwest-backed portal client.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Client;
use tokio::task::JoinHandle;
use url::Url;

use super::{check_status, MeResponse, PortalApi, ProgressReport, LOGOUT_PATH, ME_PATH, PROGRESS_PATH};
use crate::error::ApiError;
use crate::storage::PortalConfig;

/// Portal client over HTTP.
///
/// Beacons are spawned onto the current tokio runtime and their handles kept
/// so the host can give them a bounded chance to finish at teardown via
/// [`HttpPortalApi::drain_beacons`].
pub struct HttpPortalApi {
    client: Client,
    base: Url,
    beacons: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpPortalApi {
    pub fn new(config: &PortalConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref().filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ApiError::Network(format!("invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            beacons: Mutex::new(Vec::new()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    /// Number of beacons spawned and not yet drained.
    pub fn pending_beacons(&self) -> usize {
        self.beacons
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Waits up to `timeout` for outstanding beacons. Returns how many
    /// finished in time; the rest are aborted.
    pub async fn drain_beacons(&self, timeout: Duration) -> usize {
        let handles: Vec<_> = {
            let mut guard = self.beacons.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        let deadline = tokio::time::Instant::now() + timeout;
        let mut finished = 0;
        for handle in handles {
            let abort = handle.abort_handle();
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(_) => finished += 1,
                Err(_) => abort.abort(),
            }
        }
        finished
    }
}

impl PortalApi for HttpPortalApi {
    async fn fetch_me(&self) -> Result<MeResponse, ApiError> {
        let resp = self.client.get(self.endpoint(ME_PATH)?).send().await?;
        check_status(ME_PATH, resp.status().as_u16())?;
        Ok(resp.json::<MeResponse>().await?)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let resp = self.client.post(self.endpoint(LOGOUT_PATH)?).send().await?;
        check_status(LOGOUT_PATH, resp.status().as_u16())
    }

    async fn post_progress(&self, report: &ProgressReport) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.endpoint(PROGRESS_PATH)?)
            .json(report)
            .send()
            .await?;
        check_status(PROGRESS_PATH, resp.status().as_u16())
    }

    fn send_beacon(&self, report: &ProgressReport) {
        let url = match self.endpoint(PROGRESS_PATH) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "beacon dropped");
                return;
            }
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(video_id = %report.video_id, "no runtime for beacon, dropped");
            return;
        };
        let request = self.client.post(url).json(report);
        let video_id = report.video_id.clone();
        let handle = runtime.spawn(async move {
            if let Err(e) = request.send().await {
                tracing::debug!(%video_id, error = %e, "beacon delivery failed");
            }
        });
        self.beacons
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn api_for(server: &mockito::ServerGuard) -> HttpPortalApi {
        let config = PortalConfig {
            base_url: server.url(),
            session_cookie: Some("session=abc".to_string()),
            ..PortalConfig::default()
        };
        HttpPortalApi::new(&config).unwrap()
    }

    #[tokio::test]
    async fn fetch_me_parses_profile_and_sends_cookie() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/me")
            .match_header("cookie", "session=abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"authenticated": true, "first_name": "Ada", "role": "student"}"#)
            .create_async()
            .await;

        let me = api_for(&server).fetch_me().await.unwrap();
        assert!(me.authenticated);
        assert_eq!(me.first_name.as_deref(), Some("Ada"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_me_non_success_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/me")
            .with_status(500)
            .create_async()
            .await;

        let err = api_for(&server).fetch_me().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn post_progress_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/video/progress")
            .match_body(Matcher::Json(json!({
                "video_id": "intro",
                "session_id": "s-1",
                "seconds_delta": 0.0,
                "position": 0,
                "duration": 0,
                "attempt": 1,
            })))
            .with_status(200)
            .create_async()
            .await;

        api_for(&server)
            .post_progress(&ProgressReport::attempt("intro", "s-1"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_progress_401_is_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/video/progress")
            .with_status(401)
            .create_async()
            .await;

        let err = api_for(&server)
            .post_progress(&ProgressReport::new("intro"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn beacon_is_delivered_after_drain() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/video/progress")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let api = api_for(&server);
        api.send_beacon(&ProgressReport::new("intro"));
        let finished = api.drain_beacons(Duration::from_secs(5)).await;
        assert_eq!(finished, 1);
        assert_eq!(api.pending_beacons(), 0);
        mock.assert_async().await;
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = PortalConfig {
            base_url: "not a url".to_string(),
            ..PortalConfig::default()
        };
        assert!(matches!(
            HttpPortalApi::new(&config),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
