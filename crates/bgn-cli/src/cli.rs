//! CLI argument definitions using clap
//!
//! This module contains the clap structs for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// BGN - Track changes to the geographic names action list
#[derive(Parser)]
#[command(name = "bgn")]
#[command(about = "Archive and diff the BGN geographic names action list", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/bgn/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot archive directory (overrides config)
    #[arg(long, global = true)]
    pub archive_dir: Option<PathBuf>,

    /// Ledger CSV path (overrides config)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the newest action list, update the ledger, and print what changed (default)
    Run,

    /// Diff the two newest archived snapshots without fetching or touching the ledger
    Diff,

    /// List archived snapshots
    Snapshots,
}
