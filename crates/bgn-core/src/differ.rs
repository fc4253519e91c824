//! Snapshot differ and ledger merger
//!
//! Compares the two newest archived snapshots by exact row equality. A row
//! that changed in any field shows up twice in the diff (once per version);
//! there is no primary-key matching here.

use tracing::{debug, info};

use crate::archive::{Archive, SnapshotFile};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::snapshot::load_table;
use crate::table::{Record, Table};

/// Rows present in exactly one of two tables
///
/// Stacks `latest` over `previous` (columns aligned by name) and keeps rows
/// that occur once, so `latest`-only rows come first.
pub fn symmetric_difference(latest: &Table, previous: &Table) -> Table {
    latest.stack(previous).unique_rows()
}

/// Diffs the archive and keeps the ledger current
pub struct SnapshotDiffer {
    archive: Archive,
    ledger: Ledger,
}

impl SnapshotDiffer {
    pub fn new(archive: Archive, ledger: Ledger) -> Self {
        Self { archive, ledger }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Merge the newest snapshot into the ledger, then diff it against the
    /// one before it
    ///
    /// Returns `None` when the archive holds a single snapshot.
    pub fn diff_and_merge(&self) -> Result<Option<Vec<Record>>> {
        let (latest_file, previous_file) = self.latest_two()?;
        let latest = load_table(&latest_file.path)?;

        self.ledger.update(&latest)?;

        let Some(previous_file) = previous_file else {
            info!("Only one snapshot archived ({}); nothing to diff", latest_file.date);
            return Ok(None);
        };

        let previous = load_table(&previous_file.path)?;
        Ok(Some(self.diff_tables(&latest_file, &latest, &previous_file, &previous)))
    }

    /// Diff the two newest snapshots without touching the ledger
    pub fn diff_latest(&self) -> Result<Option<Vec<Record>>> {
        let (latest_file, previous_file) = self.latest_two()?;
        let Some(previous_file) = previous_file else {
            return Ok(None);
        };

        let latest = load_table(&latest_file.path)?;
        let previous = load_table(&previous_file.path)?;
        Ok(Some(self.diff_tables(&latest_file, &latest, &previous_file, &previous)))
    }

    fn latest_two(&self) -> Result<(SnapshotFile, Option<SnapshotFile>)> {
        self.archive.latest_two()?.ok_or_else(|| {
            Error::NotFound(format!(
                "No snapshots in archive {}",
                self.archive.dir().display()
            ))
        })
    }

    fn diff_tables(
        &self,
        latest_file: &SnapshotFile,
        latest: &Table,
        previous_file: &SnapshotFile,
        previous: &Table,
    ) -> Vec<Record> {
        debug!(
            "Diffing {} ({} rows) against {} ({} rows)",
            latest_file.file_name(),
            latest.len(),
            previous_file.file_name(),
            previous.len()
        );

        let diff = symmetric_difference(latest, previous);
        info!(
            "{} rows differ between {} and {}",
            diff.len(),
            previous_file.date,
            latest_file.date
        );
        diff.records()
    }
}
