//! Tracker configuration
//!
//! Config is loaded with a three-layer resolution:
//! 1. An explicit path (e.g. `bgn --config path.toml`)
//! 2. An override in the config dir (~/.config/bgn/config.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Every key is optional; missing keys keep their default value.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/bgn.toml");

/// Page that lists the current review lists
pub const DEFAULT_PAGE_URL: &str = "https://geonames.usgs.gov/apex/f?p=geonames_web:review_lists";

/// Base path that relative links on the page resolve against
pub const DEFAULT_BASE_URL: &str = "https://geonames.usgs.gov/apex/";

/// Visible text of the download link
pub const DEFAULT_LINK_TEXT: &str = "Action List";

/// How the newest snapshot is folded into the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Place the snapshot's columns beside the ledger's, aligning rows by
    /// position. Matches the layout existing `latest.csv` consumers expect.
    #[default]
    Columns,
    /// Append the snapshot's rows to the ledger, aligning columns by name.
    Rows,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Rows => "rows",
        }
    }
}

impl FromStr for MergePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "columns" | "column" => Ok(Self::Columns),
            "rows" | "row" => Ok(Self::Rows),
            other => Err(Error::Config(format!(
                "Unknown merge policy '{}' (expected 'columns' or 'rows')",
                other
            ))),
        }
    }
}

/// Where the action list is published
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub page_url: String,
    pub base_url: String,
    pub link_text: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            link_text: DEFAULT_LINK_TEXT.to_string(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub user_agent: String,
    /// No timeout unless configured
    pub timeout: Option<Duration>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("bgn-action-list/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        }
    }
}

/// Snapshot archive location
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveConfig {
    pub dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("raw"),
        }
    }
}

/// Ledger file and merge behavior
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    pub path: PathBuf,
    pub merge: MergePolicy,
    /// Natural key used by the row merge to replace older versions of a record
    pub key_column: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("latest.csv"),
            merge: MergePolicy::Columns,
            key_column: None,
        }
    }
}

/// Full tracker configuration, scoped to a single run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub source: SourceConfig,
    pub http: HttpConfig,
    pub archive: ArchiveConfig,
    pub ledger: LedgerConfig,
}

impl Config {
    /// Load configuration, preferring `path` when given
    ///
    /// An explicit path must exist. Without one, the override in the config
    /// dir is used when present, otherwise the embedded defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                read_config(path)?
            }
            None => match default_config_path() {
                Some(default_path) if default_path.exists() => read_config(&default_path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// Override the archive directory (e.g. from `--archive-dir`)
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive.dir = dir.into();
        self
    }

    /// Override the ledger path (e.g. from `--ledger`)
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger.path = path.into();
        self
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bgn").join("config.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    debug!("Reading config from {}", path.display());
    fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config {}: {}", path.display(), e))
    })
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    source: Option<RawSource>,
    http: Option<RawHttp>,
    archive: Option<RawArchive>,
    ledger: Option<RawLedger>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    page_url: Option<String>,
    base_url: Option<String>,
    link_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHttp {
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawArchive {
    dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawLedger {
    path: Option<PathBuf>,
    merge: Option<String>,
    key_column: Option<String>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(source) = raw.source {
        if let Some(page_url) = source.page_url {
            config.source.page_url = page_url;
        }
        if let Some(base_url) = source.base_url {
            config.source.base_url = base_url;
        }
        if let Some(link_text) = source.link_text {
            config.source.link_text = link_text;
        }
    }

    if let Some(http) = raw.http {
        if let Some(user_agent) = http.user_agent {
            config.http.user_agent = user_agent;
        }
        if let Some(timeout) = http.timeout_secs {
            config.http.timeout = Some(Duration::from_secs(timeout));
        }
    }

    if let Some(archive) = raw.archive {
        if let Some(dir) = archive.dir {
            config.archive.dir = dir;
        }
    }

    if let Some(ledger) = raw.ledger {
        if let Some(path) = ledger.path {
            config.ledger.path = path;
        }
        if let Some(merge) = ledger.merge {
            config.ledger.merge = merge.parse()?;
        }
        config.ledger.key_column = ledger.key_column.filter(|k| !k.trim().is_empty());
    }

    Ok(config)
}
