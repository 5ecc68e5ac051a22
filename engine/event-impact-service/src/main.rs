//! Event Impact Service
//!
//! Entry point for the `event-impact` command line tool.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use event_impact_service::{initialize_logging, Cli, CliHandler};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging first
    initialize_logging(&cli.log_level, cli.log_format)?;
    debug!("Starting event-impact v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;
    let handler = CliHandler::new(config);
    handler.handle_command(cli.command).await?;

    Ok(())
}
