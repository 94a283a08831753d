//! Process-wide tracing subscriber and metric descriptions.

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

/// Counters emitted by the query cache, with their descriptions.
pub const CACHE_COUNTERS: [(&str, &str); 4] = [
    ("inkpad_cache_hit_total", "Query cache lookups served from memory."),
    ("inkpad_cache_miss_total", "Query cache lookups that fell through to storage."),
    ("inkpad_cache_evict_total", "Query cache entries displaced by the LRU bound."),
    ("inkpad_cache_invalidate_total", "Query cache entries removed after a write."),
];

static DESCRIBED: Once = Once::new();

/// Installs the global subscriber. `RUST_LOG` refines the configured level.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    DESCRIBED.call_once(|| {
        for (name, help) in CACHE_COUNTERS {
            describe_counter!(name, Unit::Count, help);
        }
    });

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| InfraError::Telemetry(err.to_string()))
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}
