//! History store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("History store configuration error: {0}")]
    Config(String),

    #[error("History store connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Redis error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}
