//! Bounded series backend trait definition

use async_trait::async_trait;

use super::error::SeriesError;

/// Bounded, newest-first list storage
///
/// Values are opaque bytes; typing happens in `SeriesService`.
///
/// # Consistency Notes
///
/// Each call is atomic on its own (`append` is a single list push), but an
/// `append` followed by `trim` is two operations. Concurrent writers may see
/// the series briefly exceed its cap between the two; the next `trim` restores
/// it. Concurrent appends may also interleave, so timestamps are not strictly
/// ordered across writers.
#[async_trait]
pub trait BoundedSeries: Send + Sync {
    /// Insert a value at the head of the series
    async fn append(&self, series_id: &str, value: Vec<u8>) -> Result<(), SeriesError>;

    /// Keep only the first `max_len` entries (newest-first), evicting from the tail
    ///
    /// `max_len == 0` empties the series.
    async fn trim(&self, series_id: &str, max_len: usize) -> Result<(), SeriesError>;

    /// Return the full series, newest first
    async fn read_all(&self, series_id: &str) -> Result<Vec<Vec<u8>>, SeriesError>;

    /// Current number of entries
    async fn len(&self, series_id: &str) -> Result<usize, SeriesError>;

    /// Health check (validates connection)
    async fn health_check(&self) -> Result<(), SeriesError>;

    /// Release pooled connections (called once at shutdown)
    fn close(&self) {}

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
