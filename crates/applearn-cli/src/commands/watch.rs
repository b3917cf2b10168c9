//! Headless video playback against the portal.
//!
//! Plays a virtual video in real time through the same page logic a
//! browser would run, with optional tab hiding and an early unload.

use std::time::Duration;

use applearn_core::{MediumId, PageSignal, PlaybackSample};
use clap::Args;
use tokio::time::Instant;

use super::{print_events, runtime, PortalArgs};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Portal video id
    #[arg(long)]
    pub video_id: String,

    /// Video length in seconds
    #[arg(long, default_value_t = 30.0)]
    pub duration: f64,

    /// Playback rate (values above 1 simulate skipping ahead)
    #[arg(long, default_value_t = 1.0)]
    pub rate: f64,

    /// Hide the page after this many seconds
    #[arg(long)]
    pub hide_at: Option<u64>,

    /// How long the page stays hidden
    #[arg(long, default_value_t = 5)]
    pub hide_for: u64,

    /// Unload the page after this many seconds instead of playing to the end
    #[arg(long)]
    pub stop_at: Option<u64>,
}

pub fn run(portal: &PortalArgs, args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !(args.duration > 0.0) {
        return Err("--duration must be positive".into());
    }
    if !(args.rate > 0.0) {
        return Err("--rate must be positive".into());
    }

    let (mut page, config) = portal.page()?;
    let rt = runtime()?;
    rt.block_on(async move {
        if !page.bootstrap().await {
            print_events(&mut page)?;
            eprintln!("not signed in; playback will not be tracked");
            return Ok(());
        }

        let id = MediumId::from(args.video_id.as_str());
        page.register_video(id.clone(), args.duration);
        page.video_intersection(&id, 1.0).await;
        page.video_play(&id, PlaybackSample::playing(0.0, args.duration)).await;
        print_events(&mut page)?;

        let tick = Duration::from_millis(config.video.tick_interval_ms);
        let mut interval = tokio::time::interval(tick);
        interval.tick().await;
        let started = Instant::now();
        let mut hidden = false;

        loop {
            interval.tick().await;
            let elapsed = started.elapsed().as_secs_f64();
            let position = (elapsed * args.rate).min(args.duration);

            if let Some(stop_at) = args.stop_at {
                if elapsed >= stop_at as f64 {
                    page.handle_signal(PageSignal::BeforeUnload).await;
                    break;
                }
            }

            if let Some(hide_at) = args.hide_at {
                let hide_until = (hide_at + args.hide_for) as f64;
                if !hidden && elapsed >= hide_at as f64 && elapsed < hide_until {
                    hidden = true;
                    page.handle_signal(PageSignal::Hidden).await;
                } else if hidden && elapsed >= hide_until {
                    hidden = false;
                    page.handle_signal(PageSignal::Visible).await;
                }
            }

            if position >= args.duration {
                page.video_ended(&id, PlaybackSample::ended(args.duration)).await;
                break;
            }
            page.video_tick(&id, PlaybackSample::playing(position, args.duration)).await;
            print_events(&mut page)?;
        }

        print_events(&mut page)?;
        let timeout = Duration::from_millis(config.portal.beacon_timeout_ms);
        let delivered = page.api().drain_beacons(timeout).await;
        if delivered > 0 {
            tracing::info!(delivered, "unload beacons delivered");
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
