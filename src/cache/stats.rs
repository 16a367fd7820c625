//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, computations, evictions and removals.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of reads that found a live value
    pub hits: u64,
    /// Number of reads that found nothing or an expired value
    pub misses: u64,
    /// Number of `compute` callbacks that ran to completion
    pub computes: u64,
    /// Number of entries evicted by the sweeper
    pub evictions: u64,
    /// Number of evictions vetoed by an `expiring` handler
    pub cancelled_evictions: u64,
    /// Number of entries removed through `remove` or `clear`
    pub removals: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by every caller of a store.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    computes: AtomicU64,
    evictions: AtomicU64,
    cancelled_evictions: AtomicU64,
    removals: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compute(&self) {
        self.computes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled_eviction(&self) {
        self.cancelled_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a [`CacheStats`].
    pub(crate) fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computes: self.computes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            cancelled_evictions: self.cancelled_evictions.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            total_entries,
        }
    }
}
