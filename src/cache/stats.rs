//! Cache Statistics Module
//!
//! Tracks per-region metrics: hits, misses, evictions, expirations and
//! applied replication traffic.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics for one region.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful local retrievals
    pub hits: u64,
    /// Number of failed local retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Writes applied on behalf of another region
    pub replicated_writes: u64,
    /// Recency bumps applied on behalf of another region
    pub replicated_reads: u64,
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
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
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

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_replicated_write(&mut self) {
        self.replicated_writes += 1;
    }

    pub fn record_replicated_read(&mut self) {
        self.replicated_reads += 1;
    }

    // == Update Entry Count ==
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
