//! Remote fetching and listing-service link extraction.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{ReportError, Result};

static CSV_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+\.csv)["']"#).unwrap());

/// Blocking byte fetcher for remote sources.
///
/// Implementations must be thread-safe so one fetcher can serve
/// concurrent pipeline runs.
pub trait RemoteFetcher: Send + Sync {
    /// Fetch the body at `url`. Non-success statuses are errors.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`RemoteFetcher`] backed by a reqwest blocking client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default 15 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(15))
    }

    /// Create a fetcher with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ReportError::Http(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ReportError::Http(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ReportError::Http(format!("Failed to read body of {}: {}", url, e)))
    }
}

/// One downloadable file advertised by a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingEntry {
    pub filename: String,
    pub url: String,
}

/// Extract file links from a listing response.
///
/// Accepts the JSON form (`[{filename, url}]`) and falls back to scraping
/// `.csv` links out of the HTML form. Relative URLs are resolved against
/// `listing_url`.
pub fn parse_listing(body: &[u8], listing_url: &str) -> Vec<ListingEntry> {
    let entries: Vec<ListingEntry> = match serde_json::from_slice::<Vec<ListingEntry>>(body) {
        Ok(entries) => entries,
        Err(_) => {
            let html = String::from_utf8_lossy(body);
            CSV_HREF
                .captures_iter(&html)
                .map(|cap| {
                    let url = cap[1].to_string();
                    ListingEntry {
                        filename: super::locator::source_name(&url),
                        url,
                    }
                })
                .collect()
        }
    };

    let base = Url::parse(listing_url).ok();
    entries
        .into_iter()
        .map(|entry| {
            let url = match &base {
                Some(base) => base
                    .join(&entry.url)
                    .map(|u| u.to_string())
                    .unwrap_or(entry.url),
                None => entry.url,
            };
            ListingEntry {
                filename: entry.filename,
                url,
            }
        })
        .collect()
}
