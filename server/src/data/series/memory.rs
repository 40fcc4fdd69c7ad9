//! In-memory bounded series
//!
//! Process-local list storage for development and tests. History is lost on
//! restart, which is acceptable for a rolling chart buffer.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::backend::BoundedSeries;
use super::error::SeriesError;

/// In-memory series implementation
///
/// A single mutex guards all series; every operation is O(len) at worst and
/// never awaits while holding the lock.
#[derive(Default)]
pub struct InMemorySeries {
    series: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
}

impl InMemorySeries {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoundedSeries for InMemorySeries {
    async fn append(&self, series_id: &str, value: Vec<u8>) -> Result<(), SeriesError> {
        self.series
            .lock()
            .entry(series_id.to_string())
            .or_default()
            .push_front(value);
        Ok(())
    }

    async fn trim(&self, series_id: &str, max_len: usize) -> Result<(), SeriesError> {
        let mut series = self.series.lock();
        if max_len == 0 {
            series.remove(series_id);
        } else if let Some(entries) = series.get_mut(series_id) {
            entries.truncate(max_len);
        }
        Ok(())
    }

    async fn read_all(&self, series_id: &str) -> Result<Vec<Vec<u8>>, SeriesError> {
        Ok(self
            .series
            .lock()
            .get(series_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn len(&self, series_id: &str) -> Result<usize, SeriesError> {
        Ok(self.series.lock().get(series_id).map_or(0, VecDeque::len))
    }

    async fn health_check(&self) -> Result<(), SeriesError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
