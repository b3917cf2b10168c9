//! Playback-clock to credited-seconds conversion.
//!
//! Each sample compares the playhead with the previous sample. Forward
//! movement is credited, but never more than the wall-clock time that passed
//! (plus a small slack for timer jitter), and never more than the wall-clock
//! time since the current run started. That keeps seek-ahead jumps and
//! playback-rate tricks from inflating the total.

use crate::storage::VideoConfig;

use super::medium::TrackedMedium;

/// What a tick decided about flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushOptions {
    /// Send even when nothing accumulated.
    pub force: bool,
    /// Mark the report as a completed viewing.
    pub completed: bool,
}

impl FlushOptions {
    pub const REGULAR: Self = Self {
        force: false,
        completed: false,
    };
    pub const FORCED: Self = Self {
        force: true,
        completed: false,
    };
    pub const COMPLETED: Self = Self {
        force: true,
        completed: true,
    };
}

#[derive(Debug, Clone)]
pub struct Accumulator {
    slack_secs: f64,
    flush_threshold_secs: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new(&VideoConfig::default())
    }
}

impl Accumulator {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            slack_secs: config.seek_slack_secs.max(0.0),
            flush_threshold_secs: config.flush_threshold_secs,
        }
    }

    /// Starts a counting run: credit for this run is bounded by wall time from `now_ms`.
    pub fn begin_run(&self, medium: &mut TrackedMedium, now_ms: u64) {
        medium.run_started_ms = now_ms;
        medium.run_credited_secs = 0.0;
        medium.last_position = medium.position();
        medium.last_wall_ms = now_ms;
        medium.baseline_pending = false;
    }

    /// Re-arms after a gap whose playhead movement is unknown: the next
    /// sample sets the baseline and credits nothing.
    pub fn rearm(&self, medium: &mut TrackedMedium, now_ms: u64) {
        medium.last_wall_ms = now_ms;
        medium.baseline_pending = true;
    }

    /// Takes one sample. Credits forward movement when `counting`, otherwise
    /// only follows the playhead. Returns the seconds credited.
    pub fn sample(&self, medium: &mut TrackedMedium, counting: bool, now_ms: u64) -> f64 {
        let current = medium.position();
        let wall_delta = now_ms.saturating_sub(medium.last_wall_ms) as f64 / 1000.0;
        medium.last_wall_ms = now_ms;

        let baseline_pending = std::mem::take(&mut medium.baseline_pending);
        if !counting || baseline_pending {
            medium.last_position = current;
            return 0.0;
        }

        if current <= medium.last_position {
            // Backward seek or stall: rebase, credit nothing.
            medium.last_position = current;
            return 0.0;
        }

        let run_secs = now_ms.saturating_sub(medium.run_started_ms) as f64 / 1000.0;
        let budget = (run_secs - medium.run_credited_secs).max(0.0);
        let credited = (current - medium.last_position)
            .min(wall_delta + self.slack_secs)
            .min(budget);

        medium.last_position = current;
        medium.accumulated_secs += credited;
        medium.run_credited_secs += credited;
        tracing::trace!(medium = %medium.id(), credited, total = medium.accumulated_secs, "sampled");
        credited
    }

    /// Flush decision after a tick.
    pub fn flush_due(&self, medium: &TrackedMedium) -> Option<FlushOptions> {
        if medium.is_ended() {
            Some(FlushOptions::COMPLETED)
        } else if medium.accumulated_secs() >= self.flush_threshold_secs {
            Some(FlushOptions::REGULAR)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::medium::{MediumId, PlaybackSample};

    fn started(at_ms: u64, position: f64) -> (Accumulator, TrackedMedium) {
        let acc = Accumulator::default();
        let mut m = TrackedMedium::new(MediumId::from("v"), 600.0);
        m.observe(&PlaybackSample::playing(position, 600.0));
        acc.begin_run(&mut m, at_ms);
        (acc, m)
    }

    #[test]
    fn normal_playback_credits_position_delta() {
        let (acc, mut m) = started(0, 10.0);
        m.observe(&PlaybackSample::playing(11.0, 600.0));
        let credited = acc.sample(&mut m, true, 1_000);
        assert!((credited - 1.0).abs() < 1e-9);
        assert!((m.accumulated_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn seek_ahead_is_clamped_to_wall_time_plus_slack() {
        let (acc, mut m) = started(0, 10.0);
        m.observe(&PlaybackSample::playing(11.0, 600.0));
        acc.sample(&mut m, true, 1_000);
        // Jumped 60s ahead during the next second.
        m.observe(&PlaybackSample::playing(72.0, 600.0));
        let credited = acc.sample(&mut m, true, 2_000);
        assert!(credited <= 1.25 + 1e-9);
        // Never more than wall time since the run started.
        assert!(m.accumulated_secs() <= 2.0 + 1e-9);
    }

    #[test]
    fn backward_seek_rebases_without_credit() {
        let (acc, mut m) = started(0, 50.0);
        m.observe(&PlaybackSample::playing(20.0, 600.0));
        assert_eq!(acc.sample(&mut m, true, 1_000), 0.0);
        assert_eq!(m.accumulated_secs(), 0.0);
        // Playing forward from the new spot credits again.
        m.observe(&PlaybackSample::playing(21.0, 600.0));
        let credited = acc.sample(&mut m, true, 2_000);
        assert!((credited - 1.0).abs() < 1e-9);
    }

    #[test]
    fn not_counting_follows_playhead() {
        let (acc, mut m) = started(0, 10.0);
        m.observe(&PlaybackSample::playing(15.0, 600.0));
        assert_eq!(acc.sample(&mut m, false, 5_000), 0.0);
        m.observe(&PlaybackSample::playing(16.0, 600.0));
        let credited = acc.sample(&mut m, true, 6_000);
        assert!((credited - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rearm_skips_the_gap() {
        let (acc, mut m) = started(0, 10.0);
        acc.rearm(&mut m, 30_000);
        m.observe(&PlaybackSample::playing(41.0, 600.0));
        assert_eq!(acc.sample(&mut m, true, 31_000), 0.0);
        m.observe(&PlaybackSample::playing(42.0, 600.0));
        let credited = acc.sample(&mut m, true, 32_000);
        assert!((credited - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flush_due_on_threshold_or_end() {
        let acc = Accumulator::default();
        let mut m = TrackedMedium::new(MediumId::from("v"), 60.0);
        assert_eq!(acc.flush_due(&m), None);
        m.accumulated_secs = 10.0;
        assert_eq!(acc.flush_due(&m), Some(FlushOptions::REGULAR));
        m.observe(&PlaybackSample::ended(60.0));
        assert_eq!(acc.flush_due(&m), Some(FlushOptions::COMPLETED));
    }
}
