//! Seat service
//!
//! Turns one page read into a recorded sample and returns the updated
//! history. Every snapshot re-reads the page; nothing is cached in process.

mod error;
mod types;

use std::sync::Arc;

pub use error::SnapshotError;
pub use types::{Sample, SeatSettings, Snapshot};

use crate::core::config::SeatsConfig;
use crate::data::series::{SeriesError, SeriesService};
use crate::domain::source::SeatSource;
use crate::utils::time::now_millis;

/// Seats taken given the capacity and the available count.
///
/// Clamped into `[0, total]`: a page reporting more seats than the
/// configured capacity counts as nothing taken.
pub fn derive_seats_taken(total: u32, available: u32) -> u32 {
    if available > total {
        tracing::warn!(
            total_seats = total,
            available,
            "Page reports more seats than capacity, check total_seats"
        );
    }
    total.saturating_sub(available)
}

pub struct SeatService {
    source: Arc<dyn SeatSource>,
    series: Arc<SeriesService>,
    series_key: String,
    event_url: String,
    config: SeatsConfig,
}

impl SeatService {
    pub fn new(
        source: Arc<dyn SeatSource>,
        series: Arc<SeriesService>,
        series_key: impl Into<String>,
        event_url: impl Into<String>,
        config: SeatsConfig,
    ) -> Self {
        Self {
            source,
            series,
            series_key: series_key.into(),
            event_url: event_url.into(),
            config,
        }
    }

    /// Read the page, record the sample, and return the trimmed history.
    ///
    /// Steps are not transactional: if the trim or read fails after the
    /// append, the extra entry is trimmed away by the next snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let available = self.source.read(&self.event_url).await?;
        let current = derive_seats_taken(self.config.total_seats, available);

        let sample = Sample {
            timestamp: now_millis(),
            seats: current,
        };
        self.series.append(&self.series_key, &sample).await?;
        self.series
            .trim(&self.series_key, self.config.max_data_points)
            .await?;
        let history = self.series.read_all(&self.series_key).await?;

        tracing::debug!(
            available,
            current,
            history_len = history.len(),
            "Snapshot recorded"
        );

        Ok(Snapshot { current, history })
    }

    /// Stored history without taking a new reading
    pub async fn history(&self) -> Result<Vec<Sample>, SeriesError> {
        self.series.read_all(&self.series_key).await
    }

    pub fn settings(&self) -> SeatSettings {
        SeatSettings {
            total_seats: self.config.total_seats,
            max_data_points: self.config.max_data_points,
            poll_interval_ms: self.config.poll_interval_ms,
        }
    }

    pub fn event_url(&self) -> &str {
        &self.event_url
    }
}
