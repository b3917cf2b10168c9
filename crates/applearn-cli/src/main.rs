use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "applearn-cli", version, about = "AppLearn engagement tracker CLI")]
struct Cli {
    #[command(flatten)]
    portal: commands::PortalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who the portal thinks you are
    Me {
        /// Print the account view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log out of the portal
    Logout,
    /// Simulate watching a video and report the engagement
    Watch(commands::watch::WatchArgs),
    /// Launch a game and run its countdown
    Game(commands::game::GameArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("applearn_core=info,applearn_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Me { json } => commands::account::me(&cli.portal, json),
        Commands::Logout => commands::account::logout(&cli.portal),
        Commands::Watch(args) => commands::watch::run(&cli.portal, args),
        Commands::Game(args) => commands::game::run(&cli.portal, args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
