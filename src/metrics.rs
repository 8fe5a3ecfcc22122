//! Read-path counters for the badge cache.

use core::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Process-local hit, miss, and error counters.
///
/// Shared by reference between the cache adapter and whoever reports on it. Counters only move
/// forward until [`Metrics::reset`] is called.
#[derive(Debug, Default)]
pub struct Metrics {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

/// A point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        let _ = self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        let _ = self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        let _ = self.errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate_and_reset() {
        let metrics = Metrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_error();

        assert_eq!(metrics.snapshot(), MetricsSnapshot { hits: 2, misses: 1, errors: 1 });

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
