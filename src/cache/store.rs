//! Backend contract for the expiring cache.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),
    #[error("cache value could not be encoded: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A string key-value store whose entries expire on their own.
///
/// Implementations own expiry entirely: an entry written with `ttl` must not be
/// returned by `get` once `ttl` has elapsed, without any further call from the caller.
#[async_trait]
pub trait ExpiringStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous entry and restarting its TTL.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Read the live value under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
