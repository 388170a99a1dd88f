//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, writes, deletes and scavenger sweeps.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that found a value
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Completed writes, overwrites included
    pub writes: u64,
    /// Deletes that removed an entry
    pub deletes: u64,
    /// Entries removed by the scavenger
    pub scavenged: u64,
    /// Scavenger sweeps run so far
    pub sweeps: u64,
    /// Current number of entries in the cache
    pub entries: usize,
    /// Current number of trie nodes, root included
    pub nodes: usize,
}

impl CacheStats {
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

// == Stats Counters ==
/// Lock-free counters, updated from both shared and exclusive guard holders.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    scavenged: AtomicU64,
    sweeps: AtomicU64,
}

impl StatsCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sweep(&self, removed: usize) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.scavenged.fetch_add(removed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: usize, nodes: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            scavenged: self.scavenged.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            entries,
            nodes,
        }
    }
}
