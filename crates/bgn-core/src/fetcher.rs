//! Snapshot fetcher
//!
//! Downloads the action list into the archive once per publication date.
//! The body is streamed into a temp file in the archive directory and
//! renamed into place only when complete, so an interrupted download never
//! leaves a file the idempotence check would mistake for a finished one.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use reqwest::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

use crate::archive::{extension_for_url, Archive};
use crate::error::Result;
use crate::http;

/// Write buffer size for streamed downloads
pub const DOWNLOAD_BUFFER_SIZE: usize = 8192;

/// Result of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Absolute path of the archived snapshot
    pub path: PathBuf,
    /// False when the snapshot was already archived
    pub downloaded: bool,
    /// Size of the snapshot on disk
    pub bytes: u64,
}

/// Downloads snapshots into an archive
pub struct SnapshotFetcher {
    client: Client,
    archive: Archive,
}

impl SnapshotFetcher {
    pub fn new(client: Client, archive: Archive) -> Self {
        Self { client, archive }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Archive path for a new snapshot published on `updated`
    ///
    /// The extension follows the download URL; once a date is archived,
    /// `fetch` reuses that file whatever URL it is given.
    pub fn target_path(&self, updated: NaiveDate, download_url: &Url) -> PathBuf {
        self.archive
            .snapshot_path(updated, &extension_for_url(download_url.as_str()))
    }

    /// Download the snapshot unless one is already archived for `updated`
    pub async fn fetch(&self, updated: NaiveDate, download_url: &Url) -> Result<FetchOutcome> {
        if let Some(existing) = self.archive.snapshot_for(updated)? {
            info!("Snapshot already archived: {}", existing.path.display());
            return Ok(FetchOutcome {
                bytes: fs::metadata(&existing.path)?.len(),
                path: fs::canonicalize(&existing.path)?,
                downloaded: false,
            });
        }

        let target = self.target_path(updated, download_url);
        self.archive.ensure_dir()?;

        let mut response = http::get(&self.client, download_url.as_str()).await?;

        let mut tmp = NamedTempFile::new_in(self.archive.dir())?;
        let mut bytes = 0u64;
        {
            let mut writer = BufWriter::with_capacity(DOWNLOAD_BUFFER_SIZE, tmp.as_file_mut());
            while let Some(chunk) = response.chunk().await? {
                writer.write_all(&chunk)?;
                bytes += chunk.len() as u64;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        debug!("Downloaded {} bytes from {}", bytes, download_url);

        tmp.persist(&target)?;
        info!("Archived snapshot: {} ({} bytes)", target.display(), bytes);

        Ok(FetchOutcome {
            path: fs::canonicalize(&target)?,
            downloaded: true,
            bytes,
        })
    }
}
