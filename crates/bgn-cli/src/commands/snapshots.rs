//! Archive listing

use std::fs;

use anyhow::{Context, Result};
use bgn_core::{Archive, Config};
use serde_json::json;

use super::format_size;

/// Render the archive listing, newest last
pub fn snapshots_output(config: &Config, json: bool) -> Result<String> {
    let archive = Archive::new(&config.archive.dir);
    let snapshots = archive.list().with_context(|| {
        format!(
            "Failed to list snapshots in {}",
            archive.dir().display()
        )
    })?;

    let mut entries = Vec::with_capacity(snapshots.len());
    for snapshot in &snapshots {
        let size = fs::metadata(&snapshot.path)
            .with_context(|| format!("Failed to stat {}", snapshot.path.display()))?
            .len();
        entries.push((snapshot, size));
    }

    if json {
        let value: Vec<_> = entries
            .iter()
            .map(|(s, size)| {
                json!({
                    "date": s.date.to_string(),
                    "path": s.path.display().to_string(),
                    "bytes": size,
                })
            })
            .collect();
        return serde_json::to_string_pretty(&value).context("Failed to serialize snapshot list");
    }

    if entries.is_empty() {
        return Ok(format!(
            "No snapshots archived in {}",
            archive.dir().display()
        ));
    }

    let mut out = format!(
        "{} snapshots in {}\n",
        entries.len(),
        archive.dir().display()
    );
    for (snapshot, size) in &entries {
        out.push_str(&format!(
            "  {}  {:>10}  {}\n",
            snapshot.date,
            format_size(*size),
            snapshot.file_name()
        ));
    }
    Ok(out.trim_end().to_string())
}

pub fn cmd_snapshots(config: &Config, json: bool) -> Result<()> {
    println!("{}", snapshots_output(config, json)?);
    Ok(())
}
