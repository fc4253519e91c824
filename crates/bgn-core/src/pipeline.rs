//! One tracker run: resolve → fetch → diff/merge

use tracing::info;

use crate::archive::Archive;
use crate::config::Config;
use crate::differ::SnapshotDiffer;
use crate::error::Result;
use crate::fetcher::{FetchOutcome, SnapshotFetcher};
use crate::http::build_client;
use crate::ledger::Ledger;
use crate::resolver::{LatestActionList, LinkResolver};
use crate::table::Record;

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub latest: LatestActionList,
    pub fetch: FetchOutcome,
    /// `None` when fewer than two snapshots are archived
    pub diff: Option<Vec<Record>>,
}

/// Run the tracker once
///
/// Each step completes before the next starts; the first failure aborts
/// the run.
pub async fn run(config: &Config) -> Result<RunReport> {
    let client = build_client(&config.http)?;
    let archive = Archive::new(&config.archive.dir);

    let resolver = LinkResolver::new(client.clone(), config.source.clone());
    let latest = resolver.resolve_latest().await?;

    let fetcher = SnapshotFetcher::new(client, archive.clone());
    let fetch = fetcher.fetch(latest.updated, &latest.download_url).await?;

    let differ = SnapshotDiffer::new(archive, Ledger::new(&config.ledger));
    let diff = differ.diff_and_merge()?;

    info!(
        "Run complete: snapshot {} ({}), {}",
        latest.updated,
        if fetch.downloaded { "downloaded" } else { "cached" },
        match &diff {
            Some(records) => format!("{} differing rows", records.len()),
            None => "no previous snapshot".to_string(),
        }
    );

    Ok(RunReport {
        latest,
        fetch,
        diff,
    })
}
