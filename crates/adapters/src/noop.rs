//! Logger that discards everything.

use opstats_ports::{StatsLoggerPort, StatsRecord};

/// Accepts every record and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatsLogger;

impl StatsLoggerPort for NoopStatsLogger {
    fn log_stats(&self, _record: StatsRecord) {}
}
