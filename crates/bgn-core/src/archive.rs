//! Dated snapshot archive
//!
//! Every downloaded action list is kept forever as
//! `<dir>/<YYYY-MM-DD>-bgn-action-list.<ext>`. Ordering comes from the date
//! parsed out of the file name, never from string comparison.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::snapshot::SnapshotFormat;

/// File name suffix shared by all snapshots (before the extension)
pub const SNAPSHOT_SUFFIX: &str = "-bgn-action-list";

/// Extension used when the download URL doesn't name a known format
pub const DEFAULT_EXTENSION: &str = "xls";

/// One archived snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Publication date of the action list
    pub date: NaiveDate,
    pub path: PathBuf,
}

impl SnapshotFile {
    /// Parse an archive entry; `None` if the name doesn't follow the convention
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let date_part = stem.strip_suffix(SNAPSHOT_SUFFIX)?;
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        SnapshotFormat::from_path(path)?;

        Some(Self {
            date,
            path: path.to_path_buf(),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Local directory holding the dated snapshots
#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the archive directory if it doesn't exist
    pub fn ensure_dir(&self) -> Result<()> {
        if self.dir.exists() {
            if !self.dir.is_dir() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("Archive path is not a directory: {}", self.dir.display()),
                )));
            }
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        info!("Created archive directory: {}", self.dir.display());
        Ok(())
    }

    /// Target path for the snapshot published on `date`
    pub fn snapshot_path(&self, date: NaiveDate, extension: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", date.format("%Y-%m-%d"), SNAPSHOT_SUFFIX, extension))
    }

    /// All snapshots, oldest first
    ///
    /// A missing directory is an empty archive. Files that don't follow the
    /// naming convention are skipped.
    pub fn list(&self) -> Result<Vec<SnapshotFile>> {
        let mut snapshots = Vec::new();

        if !self.dir.exists() {
            return Ok(snapshots);
        }

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            match SnapshotFile::from_path(&path) {
                Some(snapshot) => snapshots.push(snapshot),
                None => debug!("Skipping non-snapshot file: {}", path.display()),
            }
        }

        // Path breaks ties so two formats for one date order deterministically
        snapshots.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
        Ok(snapshots)
    }

    /// The snapshot archived for `date`, whatever its extension
    ///
    /// An archive holds at most one snapshot per date.
    pub fn snapshot_for(&self, date: NaiveDate) -> Result<Option<SnapshotFile>> {
        Ok(self.list()?.into_iter().find(|s| s.date == date))
    }

    /// Newest snapshot and, when there is one, the snapshot before it
    pub fn latest_two(&self) -> Result<Option<(SnapshotFile, Option<SnapshotFile>)>> {
        let mut snapshots = self.list()?;
        let Some(latest) = snapshots.pop() else {
            return Ok(None);
        };
        Ok(Some((latest, snapshots.pop())))
    }
}

/// Snapshot extension for a download URL
///
/// Uses the URL path's extension when it names a readable format,
/// otherwise `xls`.
pub fn extension_for_url(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or("").to_string());

    Path::new(&path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| SnapshotFormat::from_extension(e).is_some())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_snapshot_path() {
        let archive = Archive::new("raw");
        assert_eq!(
            archive.snapshot_path(date(2024, 1, 5), "xls"),
            PathBuf::from("raw/2024-01-05-bgn-action-list.xls")
        );
    }

    #[test]
    fn test_snapshot_file_from_path() {
        let file = SnapshotFile::from_path(Path::new("raw/2023-02-01-bgn-action-list.xls")).unwrap();
        assert_eq!(file.date, date(2023, 2, 1));
        assert_eq!(file.file_name(), "2023-02-01-bgn-action-list.xls");

        assert!(SnapshotFile::from_path(Path::new("raw/notes.xls")).is_none());
        assert!(SnapshotFile::from_path(Path::new("raw/2023-13-01-bgn-action-list.xls")).is_none());
        assert!(SnapshotFile::from_path(Path::new("raw/2023-02-01-bgn-action-list.pdf")).is_none());
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let archive = Archive::new(dir.path().join("raw"));
        assert!(archive.list().unwrap().is_empty());
        assert!(archive.latest_two().unwrap().is_none());
    }

    #[test]
    fn test_list_orders_by_date_and_skips_strays() {
        let dir = TempDir::new().unwrap();
        let archive = Archive::new(dir.path());
        for name in [
            "2023-02-01-bgn-action-list.xls",
            "2022-12-15-bgn-action-list.xls",
            "2023-01-01-bgn-action-list.csv",
            "README.txt",
            "2023-03-01-bgn-action-list.xls.tmp",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("2023-04-01-bgn-action-list.xls")).unwrap();

        let dates: Vec<_> = archive.list().unwrap().iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2022, 12, 15), date(2023, 1, 1), date(2023, 2, 1)]);

        let (latest, previous) = archive.latest_two().unwrap().unwrap();
        assert_eq!(latest.date, date(2023, 2, 1));
        assert_eq!(previous.unwrap().date, date(2023, 1, 1));
    }

    #[test]
    fn test_latest_two_single_snapshot() {
        let dir = TempDir::new().unwrap();
        let archive = Archive::new(dir.path());
        fs::write(archive.snapshot_path(date(2024, 1, 5), "xls"), b"").unwrap();

        let (latest, previous) = archive.latest_two().unwrap().unwrap();
        assert_eq!(latest.date, date(2024, 1, 5));
        assert!(previous.is_none());
    }

    #[test]
    fn test_snapshot_for_matches_any_extension() {
        let dir = TempDir::new().unwrap();
        let archive = Archive::new(dir.path());
        fs::write(archive.snapshot_path(date(2024, 1, 5), "csv"), b"id\n1\n").unwrap();
        fs::write(archive.snapshot_path(date(2024, 2, 2), "xls"), b"").unwrap();

        let found = archive.snapshot_for(date(2024, 1, 5)).unwrap().unwrap();
        assert_eq!(found.file_name(), "2024-01-05-bgn-action-list.csv");
        assert!(archive.snapshot_for(date(2024, 3, 1)).unwrap().is_none());
    }

    #[test]
    fn test_ensure_dir_creates_directory() {
        let dir = TempDir::new().unwrap();
        let archive = Archive::new(dir.path().join("nested").join("raw"));
        archive.ensure_dir().unwrap();
        assert!(archive.dir().is_dir());
        // Second call is a no-op
        archive.ensure_dir().unwrap();
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw");
        fs::write(&path, b"").unwrap();
        assert!(matches!(Archive::new(&path).ensure_dir(), Err(Error::Io(_))));
    }

    #[test]
    fn test_extension_for_url() {
        assert_eq!(
            extension_for_url("https://geonames.usgs.gov/apex/files/action_list.xlsx"),
            "xlsx"
        );
        assert_eq!(
            extension_for_url("https://geonames.usgs.gov/apex/files/Action_List.XLS?v=2"),
            "xls"
        );
        assert_eq!(extension_for_url("http://127.0.0.1:8080/lists/action.csv"), "csv");
        assert_eq!(
            extension_for_url("https://geonames.usgs.gov/apex/f?p=138:2:::NO::P2_ID:123"),
            "xls"
        );
        assert_eq!(extension_for_url("files/action_list.xls"), "xls");
    }
}
