//! Seat reader
//!
//! Loads the registration page and reads the "seats left" counter.
//! - `browser` - rendered page via headless Chromium (default)
//! - `http` - plain fetch plus static HTML parsing

mod browser;
mod error;
mod extract;
mod http;

use std::sync::Arc;

use async_trait::async_trait;

pub use browser::BrowserSeatSource;
pub use error::ScrapeError;
pub use extract::extract_seat_count;
pub use http::HttpSeatSource;

use crate::core::config::{ScraperBackend, ScraperConfig};

/// A source of "seats available" readings
#[async_trait]
pub trait SeatSource: Send + Sync {
    /// Read the number of seats still available on the page at `url`.
    ///
    /// A label without digits reads as 0. No retries.
    async fn read(&self, url: &str) -> Result<u32, ScrapeError>;

    fn backend_name(&self) -> &'static str;
}

/// Build the configured seat source
pub fn from_config(config: &ScraperConfig) -> Result<Arc<dyn SeatSource>, ScrapeError> {
    let source: Arc<dyn SeatSource> = match config.backend {
        ScraperBackend::Browser => {
            let source = BrowserSeatSource::new(config)?;
            tracing::debug!(remote = source.is_remote(), "Browser seat source ready");
            Arc::new(source)
        }
        ScraperBackend::Http => Arc::new(HttpSeatSource::new(config)?),
    };
    Ok(source)
}

fn ensure_url(url: &str) -> Result<(), ScrapeError> {
    if url.trim().is_empty() {
        return Err(ScrapeError::InvalidUrl("URL must not be empty".to_string()));
    }
    Ok(())
}
