//! Ambience CLI - Offline Ambient Renderer
//!
//! Command-line interface for the Ambience engine.

use clap::Parser;
use env_logger::Env;
use log::info;

use ambience::cli::{commands, Cli, Commands};
use ambience::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Ambience v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd).await,
        None => {
            println!("Ambience v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

async fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Render(args) => commands::render(&args).await,
        Commands::Tone(args) => commands::tone(&args),
        Commands::Map { frequency } => commands::map(frequency),
    }
}
