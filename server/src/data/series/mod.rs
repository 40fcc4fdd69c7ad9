//! Seat history store
//!
//! Bounded, newest-first series with pluggable backends:
//! - In-memory (default) - process-local, for development and tests
//! - Redis - one list per series via deadpool-redis
//!
//! `SeriesService` adds the typed API on top: entries are stored as JSON so
//! the list stays readable from `redis-cli`.

mod backend;
mod error;
mod memory;
mod redis;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::BoundedSeries;
pub use error::SeriesError;
pub use memory::InMemorySeries;
pub use redis::RedisSeries;

use crate::core::config::{StoreBackend, StoreConfig};

/// History store service providing typed access to a series backend
#[derive(Clone)]
pub struct SeriesService {
    backend: Arc<dyn BoundedSeries>,
}

impl std::fmt::Debug for SeriesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesService")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl SeriesService {
    /// Create a new series service from configuration
    pub async fn new(config: &StoreConfig) -> Result<Self, SeriesError> {
        let backend: Arc<dyn BoundedSeries> = match config.backend {
            StoreBackend::Memory => {
                tracing::debug!("Initializing in-memory history store");
                Arc::new(InMemorySeries::new())
            }
            StoreBackend::Redis => {
                let redis = config.redis.as_ref().ok_or_else(|| {
                    SeriesError::Config("redis url required for Redis backend".into())
                })?;
                // RedisSeries::new logs the sanitized URL itself
                Arc::new(RedisSeries::new(&redis.url).await?)
            }
        };

        Ok(Self { backend })
    }

    /// Wrap an already constructed backend
    pub fn from_backend(backend: Arc<dyn BoundedSeries>) -> Self {
        Self { backend }
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Insert a value at the head of the series
    pub async fn append<T: Serialize>(&self, series_id: &str, value: &T) -> Result<(), SeriesError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| SeriesError::Serialization(e.to_string()))?;
        self.backend.append(series_id, bytes).await
    }

    /// Keep only the newest `max_len` entries
    pub async fn trim(&self, series_id: &str, max_len: usize) -> Result<(), SeriesError> {
        self.backend.trim(series_id, max_len).await
    }

    /// Read the full series, newest first
    ///
    /// Entries that no longer decode (e.g. written by an older schema) are
    /// skipped with a warning; they age out through `trim`.
    pub async fn read_all<T: DeserializeOwned>(
        &self,
        series_id: &str,
    ) -> Result<Vec<T>, SeriesError> {
        let raw = self.backend.read_all(series_id).await?;
        let mut values = Vec::with_capacity(raw.len());
        for (index, bytes) in raw.iter().enumerate() {
            match serde_json::from_slice(bytes) {
                Ok(value) => values.push(value),
                Err(e) => {
                    tracing::warn!(series = %series_id, index, error = %e, "Skipping undecodable history entry");
                }
            }
        }
        Ok(values)
    }

    /// Current number of entries (including undecodable ones)
    pub async fn len(&self, series_id: &str) -> Result<usize, SeriesError> {
        self.backend.len(series_id).await
    }

    /// Health check
    pub async fn health_check(&self) -> Result<(), SeriesError> {
        self.backend.health_check().await
    }

    /// Release backend connections
    pub fn close(&self) {
        self.backend.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        timestamp: i64,
        seats: u32,
    }

    fn memory_service() -> SeriesService {
        SeriesService::from_backend(Arc::new(InMemorySeries::new()))
    }

    fn memory_config() -> StoreConfig {
        StoreConfig {
            backend: StoreBackend::Memory,
            series_key: "test".to_string(),
            redis: None,
        }
    }

    #[tokio::test]
    async fn test_service_backend_name() {
        let service = SeriesService::new(&memory_config()).await.unwrap();
        assert_eq!(service.backend_name(), "memory");
        assert!(service.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_redis_backend_requires_url() {
        let config = StoreConfig {
            backend: StoreBackend::Redis,
            ..memory_config()
        };
        let err = SeriesService::new(&config).await.unwrap_err();
        assert!(matches!(err, SeriesError::Config(_)));
    }

    #[tokio::test]
    async fn test_typed_append_and_read() {
        let service = memory_service();
        let first = Point {
            timestamp: 1,
            seats: 10,
        };
        let second = Point {
            timestamp: 2,
            seats: 20,
        };

        service.append("s", &first).await.unwrap();
        service.append("s", &second).await.unwrap();

        let points: Vec<Point> = service.read_all("s").await.unwrap();
        assert_eq!(points, vec![second, first]);
    }

    #[tokio::test]
    async fn test_entries_are_json() {
        let backend = Arc::new(InMemorySeries::new());
        let service = SeriesService::from_backend(backend.clone());
        service
            .append(
                "s",
                &Point {
                    timestamp: 5,
                    seats: 7,
                },
            )
            .await
            .unwrap();

        let raw = backend.read_all("s").await.unwrap();
        assert_eq!(raw[0], br#"{"timestamp":5,"seats":7}"#.to_vec());
    }

    #[tokio::test]
    async fn test_length_never_exceeds_cap() {
        let service = memory_service();
        let max = 5;
        for i in 0..20u32 {
            let before = service.len("s").await.unwrap();
            service
                .append(
                    "s",
                    &Point {
                        timestamp: i64::from(i),
                        seats: i,
                    },
                )
                .await
                .unwrap();
            service.trim("s", max).await.unwrap();
            assert_eq!(service.len("s").await.unwrap(), (before + 1).min(max));
        }

        let points: Vec<Point> = service.read_all("s").await.unwrap();
        let seats: Vec<u32> = points.iter().map(|p| p.seats).collect();
        assert_eq!(seats, vec![19, 18, 17, 16, 15]);
    }

    #[tokio::test]
    async fn test_read_all_is_idempotent() {
        let service = memory_service();
        for i in 0..3 {
            service
                .append(
                    "s",
                    &Point {
                        timestamp: i,
                        seats: 1,
                    },
                )
                .await
                .unwrap();
        }

        let first: Vec<Point> = service.read_all("s").await.unwrap();
        let second: Vec<Point> = service.read_all("s").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_read_all_skips_undecodable_entries() {
        let backend = Arc::new(InMemorySeries::new());
        let service = SeriesService::from_backend(backend.clone());
        service
            .append(
                "s",
                &Point {
                    timestamp: 1,
                    seats: 3,
                },
            )
            .await
            .unwrap();
        backend.append("s", b"not json".to_vec()).await.unwrap();

        let points: Vec<Point> = service.read_all("s").await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(service.len("s").await.unwrap(), 2);
    }
}
