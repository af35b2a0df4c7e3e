//! Expiring key-value cache used by the student access layer.
//!
//! Two backends implement [`ExpiringStore`]:
//!
//! - **memory**: an in-process LRU map with per-entry deadlines
//! - **redis**: a shared Redis instance using `SET key value EX ttl`
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379/0"
//! ttl_seconds = 60
//! strict = false
//! ```

use std::sync::Arc;

mod config;
mod keys;
mod memory;
mod redis;
mod store;

pub use config::{CacheBackend, CacheConfig};
pub use keys::CacheKey;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use store::{CacheError, ExpiringStore};

/// Build the backend selected by `config`.
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn ExpiringStore>, CacheError> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new(config))),
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| CacheError::backend("redis backend selected without a url"))?;
            Ok(Arc::new(RedisStore::connect(url).await?))
        }
    }
}
