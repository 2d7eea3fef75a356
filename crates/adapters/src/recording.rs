//! In-memory recording logger.

use opstats_ports::{StatsKind, StatsLoggerPort, StatsRecord};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Logger that keeps every record in arrival order.
#[derive(Debug, Default)]
pub struct RecordingStatsLogger {
    records: Mutex<Vec<StatsRecord>>,
}

impl RecordingStatsLogger {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record captured so far.
    #[must_use]
    pub fn records(&self) -> Vec<StatsRecord> {
        self.guard().clone()
    }

    /// Drain captured records.
    pub fn take(&self) -> Vec<StatsRecord> {
        std::mem::take(&mut *self.guard())
    }

    /// Number of captured records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns true when nothing has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Kinds of the captured records, in arrival order.
    #[must_use]
    pub fn kinds(&self) -> Vec<StatsKind> {
        self.guard().iter().map(StatsRecord::kind).collect()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<StatsRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatsLoggerPort for RecordingStatsLogger {
    fn log_stats(&self, record: StatsRecord) {
        self.guard().push(record);
    }
}
