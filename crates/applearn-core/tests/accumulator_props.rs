//! Property tests for the video time accumulator.
//!
//! Random play/pause/seek sequences are replayed against a `VideoTracker`
//! while the test keeps its own tally of wall-clock time spent playing.

use applearn_core::tracking::{MediumId, PlaybackSample, VideoTracker};
use proptest::prelude::*;

const DURATION: f64 = 600.0;

#[derive(Debug, Clone)]
enum Step {
    /// Time passes and the playhead moves by `jump` (seeks included).
    Tick { advance_ms: u64, jump: f64 },
    Pause { advance_ms: u64 },
    Play { advance_ms: u64 },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => (0u64..3_000, -60.0f64..120.0)
            .prop_map(|(advance_ms, jump)| Step::Tick { advance_ms, jump }),
        1 => (0u64..5_000).prop_map(|advance_ms| Step::Pause { advance_ms }),
        1 => (0u64..5_000).prop_map(|advance_ms| Step::Play { advance_ms }),
    ]
}

proptest! {
    #[test]
    fn credit_never_exceeds_wall_time_played(steps in prop::collection::vec(step(), 1..80)) {
        let mut tracker = VideoTracker::default();
        let id = MediumId::from("prop");
        tracker.register(id.clone(), DURATION);
        tracker.set_in_view(&id, 1.0, 0, true);

        let mut now_ms = 0u64;
        let mut position = 0.0f64;
        let mut playing = false;
        let mut played_ms = 0u64;
        let mut reported = 0.0f64;

        for step in steps {
            let advance_ms = match step {
                Step::Tick { advance_ms, .. }
                | Step::Pause { advance_ms }
                | Step::Play { advance_ms } => advance_ms,
            };
            now_ms += advance_ms;
            if playing {
                played_ms += advance_ms;
            }

            let report = match step {
                Step::Tick { jump, .. } => {
                    position = (position + jump).clamp(0.0, DURATION - 1.0);
                    let sample = if playing {
                        PlaybackSample::playing(position, DURATION)
                    } else {
                        PlaybackSample::paused(position, DURATION)
                    };
                    tracker.tick(&id, sample, now_ms, true)
                }
                Step::Pause { .. } if playing => {
                    playing = false;
                    let report = tracker.on_pause(&id, PlaybackSample::paused(position, DURATION), now_ms, true);
                    prop_assert_eq!(tracker.medium(&id).unwrap().accumulated_secs(), 0.0);
                    report
                }
                Step::Play { .. } if !playing => {
                    playing = true;
                    tracker.on_play(&id, PlaybackSample::playing(position, DURATION), now_ms, true)
                }
                _ => None,
            };

            if let Some(report) = report {
                prop_assert!(report.seconds_delta >= 0.0);
                reported += report.seconds_delta;
            }

            let pending = tracker.medium(&id).unwrap().accumulated_secs();
            prop_assert!(pending >= 0.0);
            prop_assert!(
                reported + pending <= played_ms as f64 / 1000.0 + 1e-6,
                "credited {} > played {}",
                reported + pending,
                played_ms as f64 / 1000.0
            );
        }
    }

    #[test]
    fn backward_seeks_never_credit(offsets in prop::collection::vec(1.0f64..30.0, 1..20)) {
        let mut tracker = VideoTracker::default();
        let id = MediumId::from("rewind");
        tracker.register(id.clone(), DURATION);
        tracker.set_in_view(&id, 1.0, 0, true);
        tracker.on_play(&id, PlaybackSample::playing(DURATION - 1.0, DURATION), 0, true);

        let mut position = DURATION - 1.0;
        for (i, offset) in offsets.iter().enumerate() {
            position = (position - offset).max(0.0);
            let now_ms = (i as u64 + 1) * 1000;
            let report = tracker.tick(&id, PlaybackSample::playing(position, DURATION), now_ms, true);
            prop_assert!(report.is_none());
            prop_assert_eq!(tracker.medium(&id).unwrap().accumulated_secs(), 0.0);
        }
    }
}
