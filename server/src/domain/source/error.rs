//! Seat reader error types

use thiserror::Error;

/// Failure to obtain a seat count from the registration page
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid page URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to connect to browser: {0}")]
    Connect(String),

    #[error("Failed to load page {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Selector '{selector}' did not appear within {timeout_secs}s")]
    SelectorTimeout { selector: String, timeout_secs: u64 },

    #[error("Selector '{0}' matched no element")]
    SelectorNotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(e.to_string())
    }
}
