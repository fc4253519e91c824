//! Cumulative ledger file
//!
//! The ledger is a CSV rewritten on every run from the newest snapshot.
//! Writes go through a temp file next to the ledger and a rename.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::{LedgerConfig, MergePolicy};
use crate::error::Result;
use crate::snapshot::read_csv_table;
use crate::table::Table;

/// Ledger CSV plus the policy for folding snapshots into it
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    merge: MergePolicy,
    key_column: Option<String>,
}

impl Ledger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            path: config.path.clone(),
            merge: config.merge,
            key_column: config.key_column.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the ledger; `None` before the first run
    pub fn load(&self) -> Result<Option<Table>> {
        if !self.exists() {
            return Ok(None);
        }
        Ok(Some(read_csv_table(File::open(&self.path)?)?))
    }

    /// Fold `latest` into the ledger and write it back
    ///
    /// Without an existing ledger, `latest` is written as-is. Returns the
    /// table that was written.
    pub fn update(&self, latest: &Table) -> Result<Table> {
        let merged = match self.load()? {
            None => {
                info!("Creating ledger {}", self.path.display());
                latest.clone()
            }
            Some(existing) => {
                let merged = self.merge(&existing, latest);
                info!(
                    "Merged {} snapshot rows into ledger {} ({} policy, {} rows)",
                    latest.len(),
                    self.path.display(),
                    self.merge.as_str(),
                    merged.len()
                );
                merged
            }
        };

        write_csv_atomic(&self.path, &merged)?;
        Ok(merged)
    }

    /// Combine an existing ledger with the newest snapshot, dropping exact
    /// duplicate rows
    pub fn merge(&self, existing: &Table, latest: &Table) -> Table {
        match self.merge {
            MergePolicy::Columns => latest.concat_columns(existing).drop_duplicates(),
            MergePolicy::Rows => {
                merge_rows(existing, latest, self.key_column.as_deref()).drop_duplicates()
            }
        }
    }
}

/// Union by row, replacing ledger rows whose key reappears in `latest`
fn merge_rows(existing: &Table, latest: &Table, key_column: Option<&str>) -> Table {
    let Some(key) = key_column else {
        return existing.stack(latest);
    };

    let (Some(existing_idx), Some(latest_idx)) =
        (existing.column_index(key), latest.column_index(key))
    else {
        warn!(
            "Key column '{}' missing from ledger or snapshot; appending rows without replacement",
            key
        );
        return existing.stack(latest);
    };

    let latest_keys: HashSet<_> = latest
        .rows()
        .iter()
        .map(|row| &row[latest_idx])
        .filter(|value| !value.is_empty())
        .collect();

    let kept: Vec<_> = existing
        .rows()
        .iter()
        .filter(|row| !latest_keys.contains(&row[existing_idx]))
        .cloned()
        .collect();

    Table::with_rows(existing.columns().to_vec(), kept).stack(latest)
}

/// Write `table` as CSV via a temp file in the same directory
pub fn write_csv_atomic(path: &Path, table: &Table) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut wtr = Writer::from_writer(tmp.as_file_mut());
        wtr.write_record(table.columns())?;
        for row in table.rows() {
            wtr.write_record(row.iter().map(|value| value.to_string()))?;
        }
        wtr.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}
