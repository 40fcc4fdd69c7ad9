use thiserror::Error;

use crate::data::series::SeriesError;
use crate::domain::source::ScrapeError;

/// Failure of a snapshot request
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Seat scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("History store unavailable: {0}")]
    Store(#[from] SeriesError),
}
