//! # opstats-adapters
//!
//! Stats logger, line sink, and telemetry adapters for the port traits.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod counting;
pub mod fanout;
pub mod json;
pub mod noop;
pub mod recording;
pub mod sink;
pub mod telemetry;
pub mod tracing_logger;

pub use counting::{CountingStatsLogger, StatsCountSnapshot};
pub use fanout::FanoutStatsLogger;
pub use json::{JsonStatsLogger, StatsFields};
pub use noop::NoopStatsLogger;
pub use recording::RecordingStatsLogger;
pub use sink::{FileLineSink, LineSink, SinkError, StderrLineSink, StdoutLineSink};
pub use telemetry::{JsonTelemetry, TelemetryStatsLogger};
pub use tracing_logger::{STATS_TARGET, TracingStatsLogger};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
