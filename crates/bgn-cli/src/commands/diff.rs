//! Offline diff of the two newest archived snapshots

use anyhow::{Context, Result};
use bgn_core::{Archive, Config, Ledger, SnapshotDiffer};

use super::format_diff;

/// Diff the archive and return the rendered output
pub fn diff_output(config: &Config, json: bool) -> Result<String> {
    let differ = SnapshotDiffer::new(
        Archive::new(&config.archive.dir),
        Ledger::new(&config.ledger),
    );
    let diff = differ.diff_latest().with_context(|| {
        format!(
            "Failed to diff snapshots in {}",
            config.archive.dir.display()
        )
    })?;
    format_diff(diff.as_deref(), json)
}

pub fn cmd_diff(config: &Config, json: bool) -> Result<()> {
    println!("{}", diff_output(config, json)?);
    Ok(())
}
