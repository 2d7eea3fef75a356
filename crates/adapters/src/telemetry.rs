//! JSON telemetry adapter and the stats-to-telemetry bridge.

use crate::json::now_epoch_ms;
use crate::sink::LineSink;
use opstats_ports::{StatsLoggerPort, StatsRecord, TelemetryPort, TelemetryTags, telemetry_tags};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Telemetry adapter that emits JSON lines.
pub struct JsonTelemetry {
    sink: Arc<dyn LineSink>,
    base_tags: TelemetryTags,
    dropped: AtomicU64,
}

impl JsonTelemetry {
    /// Create a telemetry adapter backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self {
            sink,
            base_tags: TelemetryTags::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Set base tags applied to every metric.
    #[must_use]
    pub fn with_base_tags(mut self, tags: TelemetryTags) -> Self {
        self.base_tags = tags;
        self
    }

    /// Metrics that could not be written.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn emit(
        &self,
        metric_type: MetricType,
        name: &str,
        value: Value,
        tags: Option<&TelemetryTags>,
    ) {
        let tags = merge_tags(&self.base_tags, tags);
        let line = MetricLine {
            line_type: "metric",
            timestamp_ms: now_epoch_ms(),
            metric_type,
            name,
            value,
            unit: metric_type.unit(),
            tags: (!tags.is_empty()).then_some(&tags),
        }
        .encode();
        if let Err(error) = self.sink.write_line(&line) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(metric = name, sink = self.sink.name(), %error, "metric dropped");
        }
    }
}

impl TelemetryPort for JsonTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        self.emit(MetricType::Counter, name, Value::from(value), tags);
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        self.emit(MetricType::Timer, name, Value::from(duration_ms), tags);
    }

    fn record_value(&self, name: &str, value: f64, tags: Option<&TelemetryTags>) {
        // Non-finite values have no JSON encoding and are written as null.
        self.emit(MetricType::Value, name, Value::from(value), tags);
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum MetricType {
    Counter,
    Timer,
    Value,
}

impl MetricType {
    const fn unit(self) -> Option<&'static str> {
        match self {
            Self::Timer => Some("ms"),
            Self::Counter | Self::Value => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricLine<'a> {
    #[serde(rename = "type")]
    line_type: &'static str,
    timestamp_ms: u64,
    metric_type: MetricType,
    name: &'a str,
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a TelemetryTags>,
}

impl MetricLine<'_> {
    fn encode(&self) -> String {
        serde_json::to_string(self).map_or_else(
            |_| {
                "{\"type\":\"metric\",\"metricType\":\"error\",\"name\":\"telemetry.serialize_failed\",\"value\":1}\n"
                    .to_string()
            },
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        )
    }
}

fn merge_tags(base: &TelemetryTags, extra: Option<&TelemetryTags>) -> TelemetryTags {
    let mut merged = base.clone();
    if let Some(extra) = extra {
        merged.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
    merged
}

/// Logger forwarding each record to a [`TelemetryPort`].
///
/// Emits counter `stats.<kind>.count`, timer `stats.<kind>.latency` and value
/// `stats.<kind>.success` (`1` for an ok status, `0` otherwise), all tagged
/// with `kind` and `status`.
#[derive(Clone)]
pub struct TelemetryStatsLogger {
    telemetry: Arc<dyn TelemetryPort>,
}

impl TelemetryStatsLogger {
    /// Bridge onto `telemetry`.
    #[must_use]
    pub fn new(telemetry: Arc<dyn TelemetryPort>) -> Self {
        Self { telemetry }
    }
}

impl StatsLoggerPort for TelemetryStatsLogger {
    fn log_stats(&self, record: StatsRecord) {
        let kind = record.kind().as_str();
        let tags = telemetry_tags([("kind", kind), ("status", record.status_code().as_str())]);

        self.telemetry
            .increment_counter(&format!("stats.{kind}.count"), 1, Some(&tags));
        self.telemetry.record_timer_ms(
            &format!("stats.{kind}.latency"),
            record.total_latency_millis(),
            Some(&tags),
        );
        let success = if record.status_code().is_ok() { 1.0 } else { 0.0 };
        self.telemetry
            .record_value(&format!("stats.{kind}.success"), success, Some(&tags));
    }
}
