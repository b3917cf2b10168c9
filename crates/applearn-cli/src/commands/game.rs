use std::io::{self, BufRead, Write};
use std::time::Duration;

use applearn_core::game::{
    AutoConfirm, Confirm, ConfirmDialog, DismissReason, GamePhase, GameSpec, PromptOutcome,
    SystemBrowser,
};
use applearn_core::{ControlId, LaunchOutcome};
use clap::Args;

use super::{print_events, runtime, PortalArgs};

#[derive(Args, Debug)]
pub struct GameArgs {
    /// Video id the game belongs to
    #[arg(long)]
    pub video_id: String,

    /// Game id reported to the portal (defaults to the video id)
    #[arg(long)]
    pub game_id: Option<String>,

    /// Game URL to open
    #[arg(long)]
    pub url: String,

    /// Seconds the game must stay open
    #[arg(long)]
    pub seconds: Option<String>,

    /// Confirmation prompt override
    #[arg(long)]
    pub prompt: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Reads the confirmation answer from stdin.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    async fn confirm(&self, message: &str) -> PromptOutcome {
        let (controls, response) = ConfirmDialog::open(message);
        let reader = tokio::task::spawn_blocking(move || {
            eprint!("{} [y/N] ", controls.message());
            let _ = io::stderr().flush();
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => controls.dismiss(DismissReason::Closed),
                Ok(_) => match line.trim().to_ascii_lowercase().as_str() {
                    "y" | "yes" => controls.accept(),
                    "q" | "esc" => controls.dismiss(DismissReason::Escape),
                    _ => controls.cancel(),
                },
            }
        });
        let outcome = response.outcome().await;
        let _ = reader.await;
        outcome
    }
}

pub fn run(portal: &PortalArgs, args: GameArgs) -> Result<(), Box<dyn std::error::Error>> {
    url::Url::parse(&args.url)?;
    let (mut page, _config) = portal.page()?;

    let id = ControlId::from(format!("play-{}", args.video_id));
    let mut spec = GameSpec::new(id.clone(), args.video_id.as_str(), args.url.as_str());
    spec.game_id = args.game_id;
    spec.seconds = args.seconds;
    spec.prompt = args.prompt;
    page.register_game(&spec)?;

    let rt = runtime()?;
    rt.block_on(async move {
        page.bootstrap().await;
        let outcome = if args.yes {
            page.launch_game(&id, &AutoConfirm(PromptOutcome::Accepted), &SystemBrowser)
                .await?
        } else {
            page.launch_game(&id, &StdinConfirm, &SystemBrowser).await?
        };
        print_events(&mut page)?;

        if !matches!(outcome, LaunchOutcome::Started { .. }) {
            if let Some(control) = page.games().control(&id) {
                eprintln!("{}", control.status().message);
            }
            return Ok(());
        }

        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            page.tick_games().await;
            print_events(&mut page)?;
            let Some(control) = page.games().control(&id) else { break };
            if !matches!(control.phase(), GamePhase::Counting | GamePhase::Completing) {
                eprintln!("{}", control.status().message);
                break;
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
