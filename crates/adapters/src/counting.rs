//! Lock-free per-kind counters.

use opstats_ports::{StatsKind, StatsLoggerPort, StatsRecord};
use std::sync::atomic::{AtomicU64, Ordering};

/// Logger that only counts records and sums their latency, per kind.
///
/// Every update is a single relaxed atomic add, so concurrent callers never
/// block each other.
#[derive(Debug)]
pub struct CountingStatsLogger {
    counts: [AtomicU64; StatsKind::COUNT],
    latency_millis: [AtomicU64; StatsKind::COUNT],
}

impl Default for CountingStatsLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl CountingStatsLogger {
    /// Create a logger with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_millis: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Copy the current counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsCountSnapshot {
        StatsCountSnapshot {
            counts: std::array::from_fn(|index| load(&self.counts, index)),
            latency_millis: std::array::from_fn(|index| load(&self.latency_millis, index)),
        }
    }
}

fn load(cells: &[AtomicU64], index: usize) -> u64 {
    cells
        .get(index)
        .map_or(0, |cell| cell.load(Ordering::Relaxed))
}

impl StatsLoggerPort for CountingStatsLogger {
    fn log_stats(&self, record: StatsRecord) {
        let index = record.kind().index();
        if let Some(count) = self.counts.get(index) {
            count.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(latency) = self.latency_millis.get(index) {
            latency.fetch_add(record.total_latency_millis(), Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of a [`CountingStatsLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsCountSnapshot {
    counts: [u64; StatsKind::COUNT],
    latency_millis: [u64; StatsKind::COUNT],
}

impl StatsCountSnapshot {
    /// Records seen for `kind`.
    #[must_use]
    pub fn count(&self, kind: StatsKind) -> u64 {
        self.counts.get(kind.index()).copied().unwrap_or_default()
    }

    /// Summed latency for `kind`.
    #[must_use]
    pub fn total_latency_millis(&self, kind: StatsKind) -> u64 {
        self.latency_millis
            .get(kind.index())
            .copied()
            .unwrap_or_default()
    }

    /// Records seen across all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(kind, count)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (StatsKind, u64)> + '_ {
        StatsKind::ALL
            .into_iter()
            .map(|kind| (kind, self.count(kind)))
    }
}
