//! Redis-backed bounded series using deadpool-redis
//!
//! Each series is one Redis list. Samples are pushed with `LPUSH`, capped with
//! `LTRIM` and read with `LRANGE`, so the head of the list is always the newest
//! entry. Works with Redis-compatible servers (Valkey, Dragonfly).
//!
//! # URL Formats
//!
//! ```text
//! redis://[user:password@]host:port[/db]
//! rediss://[user:password@]host:port[/db]  (TLS)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, Runtime};

use super::backend::BoundedSeries;
use super::error::SeriesError;
use crate::core::constants::{REDIS_POOL_MAX_SIZE, REDIS_POOL_TIMEOUT_SECS};
use crate::utils::url::sanitize_redis_url;

/// Redis list-backed series
pub struct RedisSeries {
    pool: Pool,
}

impl RedisSeries {
    /// Connect to Redis and verify the connection with `PING`
    pub async fn new(redis_url: &str) -> Result<Self, SeriesError> {
        let sanitized_url = sanitize_redis_url(redis_url);

        let mut config = Config::from_url(redis_url);
        let timeout = Some(Duration::from_secs(REDIS_POOL_TIMEOUT_SECS));
        config.pool = Some(deadpool_redis::PoolConfig {
            max_size: REDIS_POOL_MAX_SIZE,
            timeouts: deadpool_redis::Timeouts {
                wait: timeout,
                create: timeout,
                recycle: timeout,
            },
            ..Default::default()
        });
        let pool = config.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            SeriesError::Connection(format!(
                "Failed to create Redis pool for {sanitized_url}: {e}"
            ))
        })?;

        let mut conn = pool.get().await.map_err(|e| {
            SeriesError::Connection(format!(
                "Failed to get Redis connection from pool for {sanitized_url}: {e}"
            ))
        })?;

        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| {
                SeriesError::Connection(format!("Redis PING failed for {sanitized_url}: {e}"))
            })?;

        tracing::debug!(url = %sanitized_url, "Redis history store connected");

        Ok(Self { pool })
    }
}

/// `LTRIM` stop index that keeps `max_len` entries; `None` means delete the list
fn ltrim_stop(max_len: usize) -> Option<isize> {
    match max_len {
        0 => None,
        n => Some(isize::try_from(n - 1).unwrap_or(isize::MAX)),
    }
}

#[async_trait]
impl BoundedSeries for RedisSeries {
    async fn append(&self, series_id: &str, value: Vec<u8>) -> Result<(), SeriesError> {
        let mut conn = self.pool.get().await?;
        let _: i64 = conn.lpush(series_id, value).await?;
        Ok(())
    }

    async fn trim(&self, series_id: &str, max_len: usize) -> Result<(), SeriesError> {
        let mut conn = self.pool.get().await?;
        match ltrim_stop(max_len) {
            Some(stop) => {
                let _: () = conn.ltrim(series_id, 0, stop).await?;
            }
            // LTRIM 0 -1 would keep everything
            None => {
                let _: i64 = conn.del(series_id).await?;
            }
        }
        Ok(())
    }

    async fn read_all(&self, series_id: &str) -> Result<Vec<Vec<u8>>, SeriesError> {
        let mut conn = self.pool.get().await?;
        let values: Vec<Vec<u8>> = conn.lrange(series_id, 0, -1).await?;
        Ok(values)
    }

    async fn len(&self, series_id: &str) -> Result<usize, SeriesError> {
        let mut conn = self.pool.get().await?;
        let len: usize = conn.llen(series_id).await?;
        Ok(len)
    }

    async fn health_check(&self) -> Result<(), SeriesError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| SeriesError::Connection(e.to_string()))?;

        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| SeriesError::Connection(e.to_string()))?;

        Ok(())
    }

    fn close(&self) {
        self.pool.close();
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ltrim_stop_keeps_max_len_entries() {
        assert_eq!(ltrim_stop(1), Some(0));
        assert_eq!(ltrim_stop(3), Some(2));
        assert_eq!(ltrim_stop(100), Some(99));
    }

    #[test]
    fn test_ltrim_stop_zero_deletes() {
        assert_eq!(ltrim_stop(0), None);
    }

    #[tokio::test]
    async fn test_new_fails_when_unreachable() {
        // Port 1 is reserved (tcpmux) and refuses connections on test hosts
        let result = RedisSeries::new("redis://:hunter2@127.0.0.1:1").await;
        let err = match result {
            Err(e) => e.to_string(),
            Ok(_) => panic!("expected connection failure"),
        };
        assert!(err.contains("History store connection error"));
        assert!(!err.contains("hunter2"));
    }
}
