use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::Telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "roster_cache_hit_total",
            Unit::Count,
            "Total number of student cache hits, by shape."
        );
        describe_counter!(
            "roster_cache_miss_total",
            Unit::Count,
            "Total number of student cache misses, by shape."
        );
        describe_counter!(
            "roster_cache_patch_total",
            Unit::Count,
            "Total number of in-place listing patches, by operation."
        );
        describe_counter!(
            "roster_cache_invalidate_total",
            Unit::Count,
            "Total number of cache entries deleted, by shape and reason."
        );
        describe_counter!(
            "roster_cache_backend_error_total",
            Unit::Count,
            "Total number of failed cache backend calls, by operation."
        );
        describe_counter!(
            "roster_notify_enqueued_total",
            Unit::Count,
            "Total number of new-student notifications queued."
        );
        describe_counter!(
            "roster_notify_failed_total",
            Unit::Count,
            "Total number of new-student notifications that could not be queued."
        );
    });
}
