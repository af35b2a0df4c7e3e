//! Redis-backed expiring store.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::info;

use super::store::{CacheError, ExpiringStore};

/// Shares one multiplexed connection across all callers; cloning it is cheap and
/// every clone pipelines onto the same socket.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(CacheError::backend)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::backend)?;
        info!(target = "roster::cache", "connected to redis cache backend");
        Ok(Self { connection })
    }
}

#[async_trait]
impl ExpiringStore for RedisStore {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(key, value, expiry_seconds(ttl))
            .await
            .map_err(CacheError::backend)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection.clone();
        connection
            .get::<_, Option<String>>(key)
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        connection
            .del::<_, ()>(key)
            .await
            .map_err(CacheError::backend)
    }
}

/// Redis expiry has second granularity; partial seconds round up and never reach 0.
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs()
        .saturating_add(u64::from(ttl.subsec_nanos() > 0))
        .max(1)
}
