use std::net::SocketAddr;

use thiserror::Error;

use crate::cache::CacheError;

/// Failures while wiring the process together: listeners, pools, cache backends.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("database error: {0}")]
    Database(String),
    #[error("cache backend unavailable: {0}")]
    Cache(#[from] CacheError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("missing configuration: {0}")]
    Configuration(&'static str),
}
