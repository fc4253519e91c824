//! BGN Action List Core Library
//!
//! Tracks the Board on Geographic Names action list:
//! - Link resolution against the review-lists page
//! - Idempotent, dated snapshot archive
//! - Spreadsheet and CSV snapshot loading
//! - Symmetric-difference diffing of the two newest snapshots
//! - Cumulative ledger with pluggable merge policy
//! - TOML configuration with embedded defaults

pub mod archive;
pub mod config;
pub mod differ;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod ledger;
pub mod pipeline;
pub mod resolver;
pub mod snapshot;
pub mod table;

/// Test utilities including mock BGN site
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use archive::{Archive, SnapshotFile};
pub use config::{ArchiveConfig, Config, HttpConfig, LedgerConfig, MergePolicy, SourceConfig};
pub use differ::{symmetric_difference, SnapshotDiffer};
pub use error::{Error, Result};
pub use fetcher::{FetchOutcome, SnapshotFetcher};
pub use ledger::Ledger;
pub use pipeline::{run, RunReport};
pub use resolver::{LatestActionList, LinkResolver};
pub use snapshot::load_table;
pub use table::{CellValue, Record, Table};
