//! Cache error types.

use thiserror::Error;

/// Cache operation errors.
///
/// Callers on the request path never see these: the cache is fail-open and
/// the `FileCache` wrapper logs and swallows every failure. The typed errors
/// exist for startup connectivity checks and the lock primitives.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
