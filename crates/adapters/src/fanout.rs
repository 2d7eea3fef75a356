//! Fan-out to several stats loggers.

use opstats_ports::{StatsLoggerPort, StatsRecord};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Logger forwarding every record to each child, in order.
///
/// A child that panics is skipped for that record; the remaining children
/// still receive it and the caller never observes the panic.
#[derive(Default)]
pub struct FanoutStatsLogger {
    children: Vec<Arc<dyn StatsLoggerPort>>,
    panicked: AtomicU64,
}

impl FanoutStatsLogger {
    /// Fan out to `children`.
    #[must_use]
    pub fn new(children: Vec<Arc<dyn StatsLoggerPort>>) -> Self {
        Self {
            children,
            panicked: AtomicU64::new(0),
        }
    }

    /// Append a child.
    #[must_use]
    pub fn with(mut self, child: Arc<dyn StatsLoggerPort>) -> Self {
        self.children.push(child);
        self
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true when there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child invocations that panicked.
    #[must_use]
    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }
}

impl StatsLoggerPort for FanoutStatsLogger {
    fn log_stats(&self, record: StatsRecord) {
        let kind = record.kind();
        for (position, child) in self.children.iter().enumerate() {
            let record = record.clone();
            let outcome = catch_unwind(AssertUnwindSafe(|| child.log_stats(record)));
            if outcome.is_err() {
                self.panicked.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%kind, child = position, "stats logger panicked");
            }
        }
    }
}
