//! Stats logger that emits `tracing` events.

use opstats_ports::{StatsLoggerPort, StatsRecord};

/// Target used for every stats event.
pub const STATS_TARGET: &str = "opstats::stats";

/// Logger turning each record into one `tracing` event on [`STATS_TARGET`].
///
/// Successful operations log at `info`, failed ones at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatsLogger;

impl TracingStatsLogger {
    /// Create the logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatsLoggerPort for TracingStatsLogger {
    fn log_stats(&self, record: StatsRecord) {
        let kind = record.kind().as_str();
        let status = record.status_code();
        let latency_ms = record.total_latency_millis();
        let package = record.package_name().unwrap_or_default();

        if status.is_ok() {
            tracing::info!(
                target: STATS_TARGET,
                kind,
                status = status.as_str(),
                latency_ms,
                package,
                "stats recorded"
            );
        } else {
            tracing::warn!(
                target: STATS_TARGET,
                kind,
                status = status.as_str(),
                latency_ms,
                package,
                "stats recorded for failed operation"
            );
        }
    }
}
