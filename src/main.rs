//! Clipshelf - clipboard history with pinned entries
//!
//! This is the main entry point for the clipshelf command line.

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipshelf::cli::{Cli, CliHandler};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut handler = CliHandler::new(cli.config)?;

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else {
        handler.config().log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("clipshelf={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    debug!("Clipshelf v{}", clipshelf::VERSION);

    handler.handle_command(cli.command).await?;

    Ok(())
}
