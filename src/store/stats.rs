//! Store Statistics Module
//!
//! Tracks lookup effectiveness and housekeeping for a TTL store.

use serde::Serialize;

// == Cache Stats ==
/// Hit/miss and purge counters for a TTL store.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing, or only a stale entry
    pub misses: u64,
    /// Entries physically removed by housekeeping
    pub purged: u64,
    /// Entries currently held, live or stale
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_purged(&mut self, count: usize) {
        self.purged += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
