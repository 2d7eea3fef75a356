//! Telemetry boundary contract (counters, timings, gauges).

use std::collections::BTreeMap;

/// Telemetry tags. Keep tags low-cardinality.
pub type TelemetryTags = BTreeMap<Box<str>, Box<str>>;

/// Boundary contract for telemetry.
pub trait TelemetryPort: Send + Sync {
    /// Increment a counter by `value`.
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>);

    /// Record a duration (in milliseconds) for an operation.
    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>);

    /// Record a point-in-time value.
    fn record_value(&self, name: &str, value: f64, tags: Option<&TelemetryTags>);
}

/// Build a tag map from borrowed pairs.
pub fn telemetry_tags<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> TelemetryTags {
    pairs
        .into_iter()
        .map(|(key, value)| (Box::from(key), Box::from(value)))
        .collect()
}
