//! Full tracker run

use anyhow::{Context, Result};
use bgn_core::{pipeline, Config};
use tracing::debug;

use super::format_diff;

pub async fn cmd_run(config: &Config, json: bool) -> Result<()> {
    let report = pipeline::run(config)
        .await
        .context("Failed to update the action list")?;

    debug!(
        "Snapshot {} at {} ({} bytes)",
        report.latest.updated,
        report.fetch.path.display(),
        report.fetch.bytes
    );

    println!("{}", format_diff(report.diff.as_deref(), json)?);
    Ok(())
}
