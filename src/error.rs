//! Error types for browser access, scraping, configuration and upload.
//!
//! Field-level lookups only ever fail with [`BrowserError::NotFound`] in the
//! normal case; everything else is a page-level or session-level fault. The
//! orchestrator surfaces a single [`ScrapeError`] once it runs out of attempts.

use std::time::Duration;
use thiserror::Error;

/// Faults raised by a browser session or one of its element handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    /// No element matched the locator.
    #[error("no element matches {locator}")]
    NotFound { locator: String },

    /// Navigation did not finish within the page-load timeout.
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    /// A readiness marker did not appear in time.
    #[error("timed out after {timeout:?} waiting for {locator}")]
    WaitTimeout { locator: String, timeout: Duration },

    /// The browser or DevTools connection failed.
    #[error("browser session error: {0}")]
    Session(String),

    /// The browser process could not be started.
    #[error("failed to launch browser: {0}")]
    Launch(String),
}

impl BrowserError {
    /// `true` when the fault only means "structurally absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowserError::NotFound { .. })
    }
}

/// The only error that leaves [`crate::orchestrator::Scraper::scrape`].
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("all {attempts} scrape attempts failed; last error: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: BrowserError,
    },
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Warehouse upload failures.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("BigQuery request failed: {0}")]
    BigQuery(#[from] gcp_bigquery_client::error::BQError),

    #[error("BigQuery rejected {rejected} of {rows} rows")]
    RowsRejected { rejected: usize, rows: usize },
}
