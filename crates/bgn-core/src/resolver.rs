//! Link resolver for the review-lists page
//!
//! The page carries one "Action List" link inside an element whose text
//! reads like `Action List (Updated: January 5, 2024)`. The resolver pulls
//! the publication date out of that text and turns the link's relative
//! target into an absolute download URL.

use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::http;

/// Format of the date shown on the page, e.g. "January 5, 2024"
pub const UPDATE_DATE_FORMAT: &str = "%B %d, %Y";

/// The newest action list advertised by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestActionList {
    /// Publication date shown next to the link
    pub updated: NaiveDate,
    pub download_url: Url,
}

/// Fetches the review-lists page and finds the current action list
pub struct LinkResolver {
    client: Client,
    source: SourceConfig,
}

impl LinkResolver {
    pub fn new(client: Client, source: SourceConfig) -> Self {
        Self { client, source }
    }

    /// Fetch the page and resolve the latest action list
    pub async fn resolve_latest(&self) -> Result<LatestActionList> {
        let body = http::get(&self.client, &self.source.page_url)
            .await?
            .text()
            .await?;
        debug!("Fetched review-lists page ({} bytes)", body.len());

        let latest = parse_action_list(&body, &self.source.base_url, &self.source.link_text)?;
        info!(
            "Latest action list updated {} at {}",
            latest.updated, latest.download_url
        );
        Ok(latest)
    }
}

/// Find the action list link in `html`
///
/// Matches the first `<a>` whose text equals `link_text` (ignoring
/// surrounding whitespace), reads the date from its parent element's text,
/// and resolves the `href` against `base_url`.
pub fn parse_action_list(html: &str, base_url: &str, link_text: &str) -> Result<LatestActionList> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a")
        .map_err(|e| Error::Parse(format!("Invalid link selector: {:?}", e)))?;

    let link = document
        .select(&selector)
        .find(|a| a.text().collect::<String>().trim() == link_text)
        .ok_or_else(|| Error::NotFound(format!("No '{}' link on page", link_text)))?;

    let href = link
        .value()
        .attr("href")
        .ok_or_else(|| Error::NotFound(format!("'{}' link has no href", link_text)))?;

    let container = link
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or_else(|| Error::NotFound(format!("'{}' link has no parent element", link_text)))?;

    let updated = parse_update_date(&container.text().collect::<String>())?;
    let download_url = Url::parse(base_url)?.join(href)?;

    Ok(LatestActionList {
        updated,
        download_url,
    })
}

/// Parse the date out of text like `Action List (Updated: January 5, 2024)`
///
/// Takes the segment after the first colon, drops the closing parenthesis,
/// and parses `<Month> <Day>, <Year>`.
pub fn parse_update_date(text: &str) -> Result<NaiveDate> {
    let segment = text
        .split(':')
        .nth(1)
        .ok_or_else(|| Error::Parse(format!("No update date in '{}'", text.trim())))?;

    let cleaned = segment
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = cleaned.trim_end_matches(')').trim();

    NaiveDate::parse_from_str(cleaned, UPDATE_DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("Unrecognized update date '{}': {}", cleaned, e)))
}
