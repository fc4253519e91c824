//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `run` - Full tracker run (resolve, fetch, merge, diff)
//! - `diff` - Offline diff of the archive
//! - `snapshots` - Archive listing
//!
//! Shared helpers for config loading and record output live here.

pub mod diff;
pub mod run;
pub mod snapshots;

use std::path::Path;

use anyhow::{Context, Result};
use bgn_core::{Config, Record};
use tracing::debug;

// Re-export command functions for main.rs
pub use diff::*;
pub use run::*;
pub use snapshots::*;

/// Message printed when the archive holds fewer than two snapshots
pub const SINGLE_SNAPSHOT_MESSAGE: &str = "I only found one file.";

/// Load config and apply path overrides from the command line
pub fn load_config(
    config_path: Option<&Path>,
    archive_dir: Option<&Path>,
    ledger: Option<&Path>,
) -> Result<Config> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(dir) = archive_dir {
        config = config.with_archive_dir(dir);
    }
    if let Some(path) = ledger {
        config = config.with_ledger_path(path);
    }
    debug!(
        "Archive: {}, ledger: {} ({} merge)",
        config.archive.dir.display(),
        config.ledger.path.display(),
        config.ledger.merge.as_str()
    );
    Ok(config)
}

/// Render diff records as a readable listing
///
/// One block per record, fields in column order.
pub fn format_records(records: &[Record]) -> String {
    if records.is_empty() {
        return "No differences between the two newest snapshots\n".to_string();
    }

    let width = records
        .iter()
        .flat_map(|r| r.fields().iter().map(|(name, _)| name.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{} differing rows\n", records.len());
    for (i, record) in records.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("[{}]\n", i + 1));
        for (name, value) in record.fields() {
            out.push_str(&format!("  {:<width$}  {}\n", name, value, width = width));
        }
    }
    out
}

/// Render the diff result for stdout
///
/// `None` (fewer than two snapshots) prints the fixed message, or `null`
/// in JSON mode.
pub fn format_diff(diff: Option<&[Record]>, json: bool) -> Result<String> {
    match (diff, json) {
        (Some(records), true) => {
            serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")
        }
        (None, true) => Ok("null".to_string()),
        (Some(records), false) => Ok(format_records(records).trim_end().to_string()),
        (None, false) => Ok(SINGLE_SNAPSHOT_MESSAGE.to_string()),
    }
}

/// Format a byte count for display
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
