//! One page lifetime.
//!
//! [`Page`] owns the login gate and both trackers and is the only place that
//! talks to the portal. Host events come in through its methods; reports the
//! trackers hand back are delivered here, and delivery failures are fed
//! back into the trackers (a 401 ends tracking for the rest of the page).
//!
//! Handlers take `&mut self`, so one event runs to completion before the
//! next starts, just like the browser's event loop.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::{HttpPortalApi, PortalApi, ProgressReport};
use crate::auth::{self, AccountView, AuthGate, AuthState, LogoutOutcome};
use crate::clock::{Clock, SystemClock};
use crate::error::{ApiError, GameError, Result};
use crate::events::Event;
use crate::game::{Confirm, ControlId, GameSpec, GameTracker, PromptOutcome, WindowOpener};
use crate::storage::Config;
use crate::tracking::{MediumId, PlaybackSample, VideoTracker};

/// Where a launch stands after [`Page::request_launch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStep {
    SignInRequired,
    /// Show this prompt, then hand the answer to [`Page::resolve_launch`].
    Confirm { prompt: String },
}

/// Page lifecycle signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum PageSignal {
    Hidden,
    Visible,
    PageHide,
    BeforeUnload,
    PageShow { persisted: bool },
}

/// How a launch click ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LaunchOutcome {
    SignInRequired,
    Cancelled { prompt: PromptOutcome },
    PopupBlocked,
    Started { attempt_logged: bool },
}

pub struct Page<A: PortalApi, C: Clock> {
    api: A,
    clock: C,
    auth: AuthGate,
    video: VideoTracker,
    games: GameTracker,
    events: Vec<Event>,
}

impl Page<HttpPortalApi, SystemClock> {
    /// A page talking to the configured portal over HTTP.
    pub fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        let api = HttpPortalApi::new(&config.portal)?;
        Ok(Self::new(api, SystemClock, config))
    }
}

impl<A: PortalApi, C: Clock> Page<A, C> {
    pub fn new(api: A, clock: C, config: &Config) -> Self {
        Self {
            api,
            clock,
            auth: AuthGate::new(),
            video: VideoTracker::new(&config.video),
            games: GameTracker::new(&config.game),
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn account_view(&self) -> AccountView {
        self.auth.account_view()
    }

    pub fn video(&self) -> &VideoTracker {
        &self.video
    }

    pub fn games(&self) -> &GameTracker {
        &self.games
    }

    /// Everything that happened since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.collect();
        std::mem::take(&mut self.events)
    }

    // ── Login ────────────────────────────────────────────────────────

    /// Resolves the login state. Tracking stays off when anonymous.
    pub async fn bootstrap(&mut self) -> bool {
        let authenticated = self.auth.check_authenticated(&self.api).await;
        tracing::info!(authenticated, "page ready");
        self.events.push(Event::AuthResolved {
            authenticated,
            at: Utc::now(),
        });
        authenticated
    }

    pub async fn logout(&mut self) -> LogoutOutcome {
        let outcome = auth::logout(&self.api).await;
        self.auth.invalidate();
        self.video.invalidate_sessions();
        self.games.reset_all();
        self.collect();
        outcome
    }

    // ── Video ────────────────────────────────────────────────────────

    pub fn register_video(&mut self, id: impl Into<MediumId>, duration: f64) {
        self.video.register(id.into(), duration);
    }

    pub async fn video_play(&mut self, id: &MediumId, sample: PlaybackSample) {
        let now = self.clock.now_ms();
        let report = self
            .video
            .on_play(id, sample, now, self.auth.is_authenticated());
        self.deliver_all(report).await;
    }

    pub async fn video_tick(&mut self, id: &MediumId, sample: PlaybackSample) {
        let now = self.clock.now_ms();
        let report = self.video.tick(id, sample, now, self.auth.is_authenticated());
        self.deliver_all(report).await;
    }

    pub async fn video_pause(&mut self, id: &MediumId, sample: PlaybackSample) {
        let now = self.clock.now_ms();
        let report = self
            .video
            .on_pause(id, sample, now, self.auth.is_authenticated());
        self.deliver_all(report).await;
    }

    pub async fn video_ended(&mut self, id: &MediumId, sample: PlaybackSample) {
        let now = self.clock.now_ms();
        let report = self
            .video
            .on_ended(id, sample, now, self.auth.is_authenticated());
        self.deliver_all(report).await;
    }

    /// Intersection ratio of the element with the viewport changed.
    pub async fn video_intersection(&mut self, id: &MediumId, ratio: f64) {
        let now = self.clock.now_ms();
        let report = self
            .video
            .set_in_view(id, ratio, now, self.auth.is_authenticated());
        self.deliver_all(report).await;
    }

    // ── Page lifecycle ───────────────────────────────────────────────

    pub async fn handle_signal(&mut self, signal: PageSignal) {
        let now = self.clock.now_ms();
        let authenticated = self.auth.is_authenticated();
        tracing::debug!(?signal, "page signal");

        match signal {
            PageSignal::Hidden => {
                let reports = self.video.set_page_visible(false, now, authenticated);
                self.games.reset_all();
                self.deliver_all(reports).await;
            }
            PageSignal::Visible => {
                self.video.set_page_visible(true, now, authenticated);
            }
            PageSignal::PageHide => {
                self.games.reset_all();
            }
            PageSignal::BeforeUnload => {
                for report in self.video.on_unload(now, authenticated) {
                    self.api.send_beacon(&report);
                    self.events.push(Event::BeaconQueued {
                        video_id: report.video_id.clone(),
                        seconds_delta: report.seconds_delta,
                        at: Utc::now(),
                    });
                }
                self.games.reset_all();
            }
            PageSignal::PageShow { persisted } => {
                if persisted {
                    self.games.reset_all();
                }
            }
        }
        self.collect();
    }

    // ── Games ────────────────────────────────────────────────────────

    pub fn register_game(&mut self, spec: &GameSpec) -> Result<()> {
        Ok(self.games.register(spec)?)
    }

    /// A launch control was clicked. Walks the control from idle through
    /// confirmation and window opening to a running countdown.
    ///
    /// Holds the page for the whole prompt. Hosts that must keep feeding
    /// video and visibility events while the dialog is up use
    /// [`Page::request_launch`] and [`Page::resolve_launch`] instead.
    pub async fn launch_game<P: Confirm, W: WindowOpener>(
        &mut self,
        id: &ControlId,
        confirm: &P,
        opener: &W,
    ) -> Result<LaunchOutcome> {
        let prompt = match self.request_launch(id).await? {
            LaunchStep::SignInRequired => return Ok(LaunchOutcome::SignInRequired),
            LaunchStep::Confirm { prompt } => prompt,
        };
        let answer = confirm.confirm(&prompt).await;
        self.resolve_launch(id, answer, opener).await
    }

    /// First half of a launch: resolves the login and moves the control
    /// into its confirmation step. Returns the prompt to show.
    pub async fn request_launch(&mut self, id: &ControlId) -> Result<LaunchStep> {
        let control = self
            .games
            .control(id)
            .ok_or_else(|| GameError::UnknownControl(id.to_string()))?;
        if !control.phase().is_launchable() {
            return Err(GameError::Busy(id.to_string()).into());
        }

        if !self.auth.check_authenticated(&self.api).await {
            self.games.deny_anonymous(id)?;
            self.collect();
            return Ok(LaunchStep::SignInRequired);
        }

        let prompt = self.games.begin(id)?;
        Ok(LaunchStep::Confirm { prompt })
    }

    /// Second half of a launch: applies the dialog's answer. Other page
    /// events may have run in between.
    pub async fn resolve_launch<W: WindowOpener>(
        &mut self,
        id: &ControlId,
        answer: PromptOutcome,
        opener: &W,
    ) -> Result<LaunchOutcome> {
        if !answer.is_accepted() {
            self.games.cancel(id)?;
            self.collect();
            return Ok(LaunchOutcome::Cancelled { prompt: answer });
        }

        // Login lost (401) while the prompt was up.
        if !self.auth.is_authenticated() {
            self.games.cancel(id)?;
            self.games.deny_anonymous(id)?;
            self.collect();
            return Ok(LaunchOutcome::SignInRequired);
        }

        let url = self
            .games
            .control(id)
            .ok_or_else(|| GameError::UnknownControl(id.to_string()))?
            .url()
            .to_string();
        if let Err(e) = opener.open_detached(&url) {
            tracing::warn!(control = %id, error = %e, "game window blocked");
            self.games.popup_blocked(id)?;
            self.collect();
            return Ok(LaunchOutcome::PopupBlocked);
        }

        let attempt = self.games.attempt(id)?;
        let attempt_logged = self.deliver(attempt).await;
        let now = self.clock.now_ms();
        self.games.start_countdown(id, now, attempt_logged)?;
        self.collect();
        Ok(LaunchOutcome::Started { attempt_logged })
    }

    /// Advances game countdowns and reports the ones that finished.
    /// Returns how many completed this tick.
    pub async fn tick_games(&mut self) -> usize {
        let now = self.clock.now_ms();
        let due = self.games.tick(now);
        self.collect();
        let count = due.len();
        for (id, report) in due {
            let credited = self.deliver(report).await;
            if let Err(e) = self.games.finish(&id, credited) {
                tracing::warn!(control = %id, error = %e, "could not finish game countdown");
            }
            self.collect();
        }
        count
    }

    // ── Delivery ─────────────────────────────────────────────────────

    async fn deliver_all(&mut self, reports: impl IntoIterator<Item = ProgressReport>) {
        self.collect();
        for report in reports {
            self.deliver(report).await;
        }
    }

    /// Sends one report. True when the portal accepted it. Failures are
    /// never retried; the time in the report is gone either way.
    async fn deliver(&mut self, report: ProgressReport) -> bool {
        if !self.auth.is_authenticated() {
            tracing::debug!(video_id = %report.video_id, "not authenticated, report dropped");
            return false;
        }

        match self.api.post_progress(&report).await {
            Ok(()) => {
                tracing::debug!(
                    video_id = %report.video_id,
                    seconds = report.seconds_delta,
                    "progress sent"
                );
                self.events.push(Event::ProgressSent {
                    video_id: report.video_id.clone(),
                    session_id: report.session_id.clone(),
                    seconds_delta: report.seconds_delta,
                    position: report.position,
                    completed: report.is_completion(),
                    at: Utc::now(),
                });
                true
            }
            Err(ApiError::Unauthorized) => {
                tracing::warn!(video_id = %report.video_id, "progress rejected with 401, tracking stopped");
                self.auth.invalidate();
                self.video.invalidate_sessions();
                self.collect();
                self.events.push(Event::AuthLost { at: Utc::now() });
                false
            }
            Err(e) => {
                tracing::warn!(video_id = %report.video_id, error = %e, "failed to send progress");
                self.events.push(Event::ProgressFailed {
                    video_id: report.video_id.clone(),
                    reason: e.to_string(),
                    at: Utc::now(),
                });
                false
            }
        }
    }

    /// Moves tracker events into the page log, keeping their order
    /// relative to delivery events.
    fn collect(&mut self) {
        self.events.extend(self.video.take_events());
        self.events.extend(self.games.take_events());
    }
}
