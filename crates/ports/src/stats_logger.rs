//! Stats logging boundary contract.
//!
//! Callers hand over a fully populated record and move on. Implementations
//! must tolerate concurrent calls from any thread and must never surface their
//! own failures to the caller.

use opstats_domain::{
    CallStats, InitializeStats, OptimizeStats, PutDocumentStats, RemoveStats, SearchStats,
    SetSchemaStats, StatsRecord,
};
use std::sync::Arc;

/// Boundary contract for operational stats.
///
/// Only [`StatsLoggerPort::log_stats`] is required; the typed helpers wrap the
/// payload and dispatch through it. [`StatsRecord`] is non-exhaustive, so
/// implementations outside this workspace need a wildcard arm.
pub trait StatsLoggerPort: Send + Sync {
    /// Accept one record. Fire-and-forget.
    fn log_stats(&self, record: StatsRecord);

    /// Log API call stats.
    fn log_call(&self, stats: CallStats) {
        self.log_stats(StatsRecord::Call(stats));
    }

    /// Log document put stats.
    fn log_put_document(&self, stats: PutDocumentStats) {
        self.log_stats(StatsRecord::PutDocument(stats));
    }

    /// Log initialization stats.
    fn log_initialize(&self, stats: InitializeStats) {
        self.log_stats(StatsRecord::Initialize(stats));
    }

    /// Log search stats.
    fn log_search(&self, stats: SearchStats) {
        self.log_stats(StatsRecord::Search(stats));
    }

    /// Log remove stats.
    fn log_remove(&self, stats: RemoveStats) {
        self.log_stats(StatsRecord::Remove(stats));
    }

    /// Log compaction stats.
    fn log_optimize(&self, stats: OptimizeStats) {
        self.log_stats(StatsRecord::Optimize(stats));
    }

    /// Log schema update stats.
    fn log_set_schema(&self, stats: SetSchemaStats) {
        self.log_stats(StatsRecord::SetSchema(stats));
    }
}

impl<L: StatsLoggerPort + ?Sized> StatsLoggerPort for Arc<L> {
    fn log_stats(&self, record: StatsRecord) {
        (**self).log_stats(record);
    }
}

impl<L: StatsLoggerPort + ?Sized> StatsLoggerPort for Box<L> {
    fn log_stats(&self, record: StatsRecord) {
        (**self).log_stats(record);
    }
}
