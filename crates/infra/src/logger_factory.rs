//! Stats logger stack selection and wiring.

use crate::InfraResult;
use opstats_adapters::{
    CountingStatsLogger, FanoutStatsLogger, FileLineSink, JsonStatsLogger, JsonTelemetry,
    LineSink, NoopStatsLogger, StatsCountSnapshot, StatsFields, StderrLineSink, StdoutLineSink,
    TelemetryStatsLogger, TracingStatsLogger,
};
use opstats_config::{SinkConfig, SinkKind, StatsBackendKind, ValidatedStatsConfig};
use opstats_ports::{StatsLoggerPort, TelemetryTags};
use opstats_shared::{ErrorCode, ErrorEnvelope};
use serde_json::Value;
use std::sync::Arc;

/// A configured logger plus handles to the stateful backends inside it.
pub struct StatsLoggerStack {
    fanout: Arc<FanoutStatsLogger>,
    backends: Vec<StatsBackendKind>,
    counting: Option<Arc<CountingStatsLogger>>,
    json: Option<Arc<JsonStatsLogger>>,
    telemetry: Option<Arc<JsonTelemetry>>,
}

impl StatsLoggerStack {
    /// The logger callers dispatch into.
    #[must_use]
    pub fn logger(&self) -> Arc<dyn StatsLoggerPort> {
        self.fanout.clone()
    }

    /// Enabled backends, in normalized order.
    #[must_use]
    pub fn backends(&self) -> &[StatsBackendKind] {
        &self.backends
    }

    /// Per-kind counters, when the `counting` backend is enabled.
    #[must_use]
    pub fn counts(&self) -> Option<StatsCountSnapshot> {
        self.counting.as_ref().map(|counting| counting.snapshot())
    }

    /// Records lost inside the stack: unwritable lines and panicking backends.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        let json = self.json.as_ref().map_or(0, |json| json.dropped());
        let telemetry = self
            .telemetry
            .as_ref()
            .map_or(0, |telemetry| telemetry.dropped());
        json + telemetry + self.fanout.panicked()
    }
}

impl std::fmt::Debug for StatsLoggerStack {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("StatsLoggerStack")
            .field("backends", &self.backends)
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

/// Build the logger stack described by the config.
///
/// The sink is opened only when a backend writes to it.
pub fn build_stats_logger(config: &ValidatedStatsConfig) -> InfraResult<StatsLoggerStack> {
    let sink: Arc<dyn LineSink> = if config.needs_sink() {
        build_line_sink(&config.sink)?
    } else {
        Arc::new(StderrLineSink)
    };
    Ok(build_stats_logger_with_sink(config, sink))
}

/// Build the logger stack, routing line-oriented backends to `sink`.
pub fn build_stats_logger_with_sink(
    config: &ValidatedStatsConfig,
    sink: Arc<dyn LineSink>,
) -> StatsLoggerStack {
    let mut fanout = FanoutStatsLogger::default();
    let mut counting = None;
    let mut json = None;
    let mut telemetry = None;

    for backend in &config.backends {
        match backend {
            StatsBackendKind::Counting => {
                let logger = Arc::new(CountingStatsLogger::new());
                counting = Some(logger.clone());
                fanout = fanout.with(logger);
            },
            StatsBackendKind::Json => {
                let logger = Arc::new(
                    JsonStatsLogger::new(sink.clone()).with_base_fields(json_fields(config)),
                );
                json = Some(logger.clone());
                fanout = fanout.with(logger);
            },
            StatsBackendKind::Noop => fanout = fanout.with(Arc::new(NoopStatsLogger)),
            StatsBackendKind::Telemetry => {
                let port =
                    Arc::new(JsonTelemetry::new(sink.clone()).with_base_tags(telemetry_tags(config)));
                telemetry = Some(port.clone());
                fanout = fanout.with(Arc::new(TelemetryStatsLogger::new(port)));
            },
            StatsBackendKind::Tracing => fanout = fanout.with(Arc::new(TracingStatsLogger::new())),
        }
    }

    tracing::debug!(
        backends = ?config.backends,
        sink = sink.name(),
        "stats logger stack built"
    );

    StatsLoggerStack {
        fanout: Arc::new(fanout),
        backends: config.backends.clone(),
        counting,
        json,
        telemetry,
    }
}

/// Open the configured sink.
pub fn build_line_sink(config: &SinkConfig) -> InfraResult<Arc<dyn LineSink>> {
    match config.kind {
        SinkKind::Stderr => Ok(Arc::new(StderrLineSink)),
        SinkKind::Stdout => Ok(Arc::new(StdoutLineSink)),
        SinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                ErrorEnvelope::invariant(
                    ErrorCode::new("config", "missing_sink_path"),
                    "file sink reached the factory without a path",
                )
            })?;
            let sink = FileLineSink::open(path).map_err(ErrorEnvelope::from)?;
            Ok(Arc::new(sink))
        },
    }
}

fn json_fields(config: &ValidatedStatsConfig) -> StatsFields {
    config
        .base_fields
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.to_string())))
        .collect()
}

fn telemetry_tags(config: &ValidatedStatsConfig) -> TelemetryTags {
    config.base_fields.clone()
}
