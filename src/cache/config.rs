//! Cache configuration.
//!
//! Controls the backend choice, entry lifetime and failure policy via `roster.toml`.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TTL_SECS: u64 = 60;
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// Which [`ExpiringStore`](super::ExpiringStore) implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl CacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
        }
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend `{other}` (expected memory|redis)")),
        }
    }
}

/// Resolved cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backend holding the entries.
    pub backend: CacheBackend,
    /// Connection URL, required for the redis backend.
    pub redis_url: Option<String>,
    /// Lifetime of item and listing entries alike.
    pub ttl: Duration,
    /// Surface backend failures to callers instead of logging and continuing.
    pub strict: bool,
    /// Maximum entries held by the memory backend before LRU eviction.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            strict: false,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            ttl: settings.ttl,
            strict: settings.strict,
            memory_capacity: settings.memory_capacity.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, CacheBackend::Memory);
        assert!(config.redis_url.is_none());
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert!(!config.strict);
        assert_eq!(config.memory_capacity, 10_000);
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Redis".parse::<CacheBackend>(), Ok(CacheBackend::Redis));
        assert_eq!(" memory ".parse::<CacheBackend>(), Ok(CacheBackend::Memory));
        assert!("memcached".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            memory_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.memory_capacity_non_zero().get(), 1);
    }
}
