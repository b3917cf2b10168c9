//! Video engagement tracker.
//!
//! Owns one [`TrackedMedium`] per registered element and reacts to element
//! and page events. Every handler is synchronous and returns the reports the
//! caller must deliver; nothing here performs I/O.
//!
//! ## Counting
//!
//! A medium accrues time only while all of these hold:
//!
//! - the page is authenticated
//! - the page is visible
//! - the element is in view (intersection ratio at or above the threshold)
//! - the element is playing and its tick is armed
//!
//! Losing any of them flushes whatever has accumulated and disarms the tick;
//! regaining them re-arms it from a fresh baseline so hidden time is never
//! credited.

use std::collections::HashMap;

use chrono::Utc;

use crate::api::ProgressReport;
use crate::events::Event;
use crate::storage::VideoConfig;

use super::accumulator::{Accumulator, FlushOptions};
use super::medium::{MediumId, PlaybackSample, TrackedMedium};
use super::reporter::ProgressReporter;
use super::session::SessionManager;

#[derive(Debug)]
pub struct VideoTracker {
    media: HashMap<MediumId, TrackedMedium>,
    page_visible: bool,
    visibility_ratio: f64,
    sessions: SessionManager,
    accumulator: Accumulator,
    reporter: ProgressReporter,
    events: Vec<Event>,
}

impl Default for VideoTracker {
    fn default() -> Self {
        Self::new(&VideoConfig::default())
    }
}

impl VideoTracker {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            media: HashMap::new(),
            page_visible: true,
            visibility_ratio: config.visibility_ratio,
            sessions: SessionManager::new(config.restart_threshold_secs),
            accumulator: Accumulator::new(config),
            reporter: ProgressReporter,
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn medium(&self, id: &MediumId) -> Option<&TrackedMedium> {
        self.media.get(id)
    }

    pub fn media(&self) -> impl Iterator<Item = &TrackedMedium> {
        self.media.values()
    }

    pub fn is_page_visible(&self) -> bool {
        self.page_visible
    }

    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Element events ───────────────────────────────────────────────

    /// Starts observing an element. Re-registering keeps existing state.
    pub fn register(&mut self, id: MediumId, duration: f64) {
        self.media
            .entry(id.clone())
            .or_insert_with(|| TrackedMedium::new(id, duration));
    }

    /// `play`: ensure a session, arm the tick, announce the start.
    pub fn on_play(
        &mut self,
        id: &MediumId,
        sample: PlaybackSample,
        now_ms: u64,
        authenticated: bool,
    ) -> Option<ProgressReport> {
        if !authenticated {
            return None;
        }
        let medium = self.media.get_mut(id)?;
        medium.observe(&sample);

        let (session, minted) = self.sessions.ensure_session(medium);
        if minted {
            tracing::info!(video_id = %id, session_id = %session, "session started");
            self.events.push(Event::SessionStarted {
                video_id: id.to_string(),
                session_id: session.to_string(),
                at: Utc::now(),
            });
        }

        self.accumulator.begin_run(medium, now_ms);
        medium.ticking = true;
        Some(self.reporter.started(medium))
    }

    /// Periodic tick for one element.
    pub fn tick(
        &mut self,
        id: &MediumId,
        sample: PlaybackSample,
        now_ms: u64,
        authenticated: bool,
    ) -> Option<ProgressReport> {
        let page_visible = self.page_visible;
        let medium = self.media.get_mut(id)?;
        if !medium.ticking {
            return None;
        }
        // Play state over the elapsed interval is the one seen before this sample.
        let counting = authenticated && page_visible && medium.in_view && medium.is_playing();
        medium.observe(&sample);
        self.accumulator.sample(medium, counting, now_ms);

        let options = self.accumulator.flush_due(medium)?;
        if options.completed {
            medium.ticking = false;
        }
        let report = self.reporter.flush(medium, options, authenticated);
        if options.completed {
            self.end_session(id);
        }
        report
    }

    /// `pause`: credit up to now, disarm, force a flush.
    pub fn on_pause(
        &mut self,
        id: &MediumId,
        sample: PlaybackSample,
        now_ms: u64,
        authenticated: bool,
    ) -> Option<ProgressReport> {
        let medium = self.media.get_mut(id)?;
        let was_ticking = medium.ticking;
        self.settle(id, sample, now_ms, authenticated);
        let medium = self.media.get_mut(id)?;
        if !was_ticking && medium.session_id().is_none() {
            return None;
        }
        self.reporter.flush(medium, FlushOptions::FORCED, authenticated)
    }

    /// `ended`: credit up to now, flush as completed, close the session.
    pub fn on_ended(
        &mut self,
        id: &MediumId,
        sample: PlaybackSample,
        now_ms: u64,
        authenticated: bool,
    ) -> Option<ProgressReport> {
        self.settle(id, sample, now_ms, authenticated);
        let medium = self.media.get_mut(id)?;
        // No live session: never played, or a tick already sent the completion.
        if medium.session_id().is_none() || medium.session_ended {
            return None;
        }
        let report = self
            .reporter
            .flush(medium, FlushOptions::COMPLETED, authenticated);
        self.end_session(id);
        report
    }

    /// Intersection change. Leaving the viewport flushes and disarms;
    /// entering re-arms a playing element without back-crediting.
    pub fn set_in_view(
        &mut self,
        id: &MediumId,
        ratio: f64,
        now_ms: u64,
        authenticated: bool,
    ) -> Option<ProgressReport> {
        let in_view = ratio >= self.visibility_ratio;
        let page_visible = self.page_visible;
        let medium = self.media.get_mut(id)?;
        if medium.in_view == in_view {
            return None;
        }

        if in_view {
            medium.in_view = true;
            if page_visible && authenticated && medium.session_id().is_some() && medium.is_playing() {
                self.accumulator.rearm(medium, now_ms);
                medium.ticking = true;
            }
            return None;
        }

        let was_ticking = medium.ticking;
        let sample = medium.last_sample();
        self.settle(id, sample, now_ms, authenticated);
        let medium = self.media.get_mut(id)?;
        medium.in_view = false;
        if !was_ticking {
            return None;
        }
        self.reporter.flush(medium, FlushOptions::FORCED, authenticated)
    }

    // ── Page events ──────────────────────────────────────────────────

    /// Page visibility change. Hiding force-flushes every medium that has
    /// played; showing re-arms the ones still playing and in view.
    pub fn set_page_visible(
        &mut self,
        visible: bool,
        now_ms: u64,
        authenticated: bool,
    ) -> Vec<ProgressReport> {
        if self.page_visible == visible {
            return Vec::new();
        }

        if visible {
            self.page_visible = true;
            for medium in self.media.values_mut() {
                if authenticated
                    && medium.in_view
                    && medium.is_playing()
                    && medium.session_id().is_some()
                {
                    self.accumulator.rearm(medium, now_ms);
                    medium.ticking = true;
                }
            }
            return Vec::new();
        }

        let ids = self.sorted_ids();
        let mut reports = Vec::new();
        for id in &ids {
            let Some(sample) = self.media.get(id).map(TrackedMedium::last_sample) else { continue };
            self.settle(id, sample, now_ms, authenticated);
        }
        self.page_visible = false;
        for id in &ids {
            let Some(medium) = self.media.get_mut(id) else { continue };
            if medium.session_id().is_none() {
                continue;
            }
            if let Some(report) = self.reporter.flush(medium, FlushOptions::FORCED, authenticated) {
                reports.push(report);
            }
        }
        reports
    }

    /// Teardown: disarm everything and hand back beacon reports for
    /// unreported time.
    pub fn on_unload(&mut self, now_ms: u64, authenticated: bool) -> Vec<ProgressReport> {
        let ids = self.sorted_ids();
        let mut reports = Vec::new();
        for id in &ids {
            let Some(sample) = self.media.get(id).map(TrackedMedium::last_sample) else { continue };
            self.settle(id, sample, now_ms, authenticated);
            let Some(medium) = self.media.get_mut(id) else { continue };
            if let Some(report) = self.reporter.unload(medium, authenticated) {
                reports.push(report);
            }
        }
        reports
    }

    /// Login lost: drop sessions and unreported time, stop counting.
    pub fn invalidate_sessions(&mut self) {
        for medium in self.media.values_mut() {
            self.sessions.invalidate(medium);
            medium.take_accumulated();
            medium.ticking = false;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Final sample before a medium stops ticking. The element was playing
    /// up to this event, so the pre-event play state decides counting.
    fn settle(&mut self, id: &MediumId, sample: PlaybackSample, now_ms: u64, authenticated: bool) {
        let page_visible = self.page_visible;
        let Some(medium) = self.media.get_mut(id) else { return };
        let counting = authenticated && page_visible && medium.in_view && medium.ticking;
        medium.observe(&sample);
        self.accumulator.sample(medium, counting, now_ms);
        medium.ticking = false;
    }

    fn end_session(&mut self, id: &MediumId) {
        let Some(medium) = self.media.get_mut(id) else { return };
        if let Some(session) = self.sessions.end_session(medium) {
            tracing::info!(video_id = %id, session_id = %session, "session ended");
            self.events.push(Event::SessionEnded {
                video_id: id.to_string(),
                session_id: session.to_string(),
                at: Utc::now(),
            });
        }
    }

    fn sorted_ids(&self) -> Vec<MediumId> {
        let mut ids: Vec<_> = self.media.keys().cloned().collect();
        ids.sort();
        ids
    }
}
