//! BGN CLI - Geographic names action list tracker
//!
//! Usage:
//!   bgn                       Fetch, merge, and print the latest changes
//!   bgn diff                  Diff the two newest archived snapshots
//!   bgn snapshots             List archived snapshots

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr; stdout carries only results
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = commands::load_config(
        cli.config.as_deref(),
        cli.archive_dir.as_deref(),
        cli.ledger.as_deref(),
    )?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::cmd_run(&config, cli.json).await,
        Commands::Diff => commands::cmd_diff(&config, cli.json),
        Commands::Snapshots => commands::cmd_snapshots(&config, cli.json),
    }
}
