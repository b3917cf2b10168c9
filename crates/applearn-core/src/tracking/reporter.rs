//! Turns accumulated seconds into progress reports.
//!
//! The accumulator is always emptied before a report exists, so a report
//! that later fails to send is simply lost; it is never re-sent with the
//! same seconds. The portal is the source of truth for totals.

use crate::api::{whole_seconds, ProgressReport};

use super::accumulator::FlushOptions;
use super::medium::TrackedMedium;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressReporter;

impl ProgressReporter {
    /// Empties the accumulator and builds a report when there is time to
    /// report or the flush is forced. Anonymous pages only get the reset.
    pub fn flush(
        &self,
        medium: &mut TrackedMedium,
        options: FlushOptions,
        authenticated: bool,
    ) -> Option<ProgressReport> {
        let seconds = medium.take_accumulated();
        if !authenticated {
            return None;
        }
        if !options.force && seconds <= 0.0 {
            return None;
        }
        let mut report = self.base_report(medium);
        report.seconds_delta = seconds;
        if options.completed {
            report.completed = Some(true);
        }
        tracing::debug!(
            video_id = %report.video_id,
            seconds,
            force = options.force,
            completed = options.completed,
            "flush"
        );
        Some(report)
    }

    /// Zero-second report sent when playback starts.
    pub fn started(&self, medium: &TrackedMedium) -> ProgressReport {
        ProgressReport {
            started: Some(true),
            ..self.base_report(medium)
        }
    }

    /// Teardown report for the beacon transport. Only produced when there is
    /// unreported time; `completed` is always explicit.
    pub fn unload(&self, medium: &mut TrackedMedium, authenticated: bool) -> Option<ProgressReport> {
        if !authenticated || medium.accumulated_secs() <= 0.0 {
            return None;
        }
        let seconds = medium.take_accumulated();
        Some(ProgressReport {
            seconds_delta: seconds,
            completed: Some(medium.is_ended()),
            ..self.base_report(medium)
        })
    }

    fn base_report(&self, medium: &TrackedMedium) -> ProgressReport {
        ProgressReport {
            session_id: medium.session_id().map(|s| s.to_string()),
            position: whole_seconds(medium.position()),
            duration: whole_seconds(medium.duration()),
            ..ProgressReport::new(medium.id().as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::medium::{MediumId, PlaybackSample};

    fn medium_with(seconds: f64) -> TrackedMedium {
        let mut m = TrackedMedium::new(MediumId::from("lesson-1"), 125.4);
        m.observe(&PlaybackSample::paused(42.6, 125.4));
        m.accumulated_secs = seconds;
        m
    }

    #[test]
    fn flush_reports_and_zeroes() {
        let mut m = medium_with(3.5);
        let report = ProgressReporter
            .flush(&mut m, FlushOptions::REGULAR, true)
            .unwrap();
        assert_eq!(report.seconds_delta, 3.5);
        assert_eq!(report.position, 43);
        assert_eq!(report.duration, 125);
        assert_eq!(report.completed, None);
        assert_eq!(m.accumulated_secs(), 0.0);
    }

    #[test]
    fn unforced_flush_with_nothing_is_skipped() {
        let mut m = medium_with(0.0);
        assert!(ProgressReporter.flush(&mut m, FlushOptions::REGULAR, true).is_none());
        let forced = ProgressReporter.flush(&mut m, FlushOptions::FORCED, true).unwrap();
        assert_eq!(forced.seconds_delta, 0.0);
    }

    #[test]
    fn anonymous_flush_only_resets() {
        let mut m = medium_with(8.0);
        assert!(ProgressReporter.flush(&mut m, FlushOptions::FORCED, false).is_none());
        assert_eq!(m.accumulated_secs(), 0.0);
    }

    #[test]
    fn completed_flush_sets_flag() {
        let mut m = medium_with(1.0);
        let report = ProgressReporter
            .flush(&mut m, FlushOptions::COMPLETED, true)
            .unwrap();
        assert!(report.is_completion());
    }

    #[test]
    fn unload_carries_explicit_completed_flag() {
        let mut m = medium_with(2.0);
        let report = ProgressReporter.unload(&mut m, true).unwrap();
        assert_eq!(report.completed, Some(false));
        assert_eq!(m.accumulated_secs(), 0.0);
        assert!(ProgressReporter.unload(&mut m, true).is_none());
    }
}
