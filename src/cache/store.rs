//! Cache Store Module
//!
//! Main cache engine combining a key index, the recency list and the expiry
//! scheduler. One store backs one region and is not synchronized itself;
//! callers serialize access through the region lock.

use std::collections::HashMap;

use tokio::time::{Duration, Instant};

use crate::cache::{
    CacheEntry, CacheStats, ExpiryScheduler, RecencyList, MAX_KEY_LENGTH, MAX_TTL,
};
use crate::error::{CacheError, Result};

// == Put Outcome ==
/// What a `put` did besides storing the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOutcome {
    /// An existing entry for the key was replaced
    pub replaced: bool,
    /// Key evicted from the tail to make room
    pub evicted: Option<String>,
}

// == Snapshot Entry ==
/// Owned copy of a live entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry<V> {
    pub key: String,
    pub value: V,
    pub expires_at: Instant,
}

// == Cache Store ==
/// Bounded LRU store with per-entry TTL.
///
/// Invariants: every key in `index` names exactly one node of `recency`
/// and vice versa, `index.len() <= capacity`, and every entry carries one
/// armed expiry handle.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key to recency slot
    index: HashMap<String, usize>,
    /// Access order, head = most recent
    recency: RecencyList<CacheEntry<V>>,
    /// Pending removals
    expiry: ExpiryScheduler,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL for writes that do not specify one
    default_ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Errors
    /// `CacheError::Config` if `capacity` or `default_ttl` is zero.
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::Config(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if default_ttl.is_zero() {
            return Err(CacheError::Config(
                "default TTL must be greater than zero".to_string(),
            ));
        }

        Ok(Self::empty(capacity, default_ttl))
    }

    fn empty(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            recency: RecencyList::with_capacity(capacity),
            expiry: ExpiryScheduler::new(),
            stats: CacheStats::new(),
            capacity,
            default_ttl,
        }
    }

    // == Effective TTL ==
    /// Resolves a requested TTL. `None` and zero both fall back to the
    /// default TTL; longer TTLs are capped at `MAX_TTL`.
    pub fn effective_ttl(&self, ttl: Option<Duration>) -> Duration {
        match ttl {
            Some(ttl) if !ttl.is_zero() => ttl.min(MAX_TTL),
            _ => self.default_ttl,
        }
    }

    // == Put ==
    /// Stores a key-value pair.
    ///
    /// Entries already past their deadline are removed first, so they never
    /// count towards capacity. An existing entry for the key is dropped (its
    /// expiry cancelled) and the write is treated as a fresh insert. At
    /// capacity the least recently used live entry is evicted. The new entry
    /// becomes the most recently used and arms a new expiry.
    ///
    /// # Errors
    /// `CacheError::InvalidRequest` if the key is empty or too long.
    pub fn put(&mut self, key: String, value: V, ttl: Option<Duration>) -> Result<PutOutcome> {
        validate_key(&key)?;

        let now = Instant::now();
        self.expire_due(now);

        let mut outcome = PutOutcome {
            replaced: self.remove_entry(&key).is_some(),
            evicted: None,
        };

        if self.index.len() >= self.capacity {
            outcome.evicted = self.evict_lru();
        }

        let ttl = self.effective_ttl(ttl);
        self.insert_entry(CacheEntry::new(key, value, now, now + ttl));

        Ok(outcome)
    }

    // == Get ==
    /// Retrieves a value and marks it most recently used.
    ///
    /// Absent or expired keys yield None. An expired entry found here is
    /// removed immediately and its timer cancelled. The TTL is not
    /// refreshed.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.live_slot(key) {
            Some(slot) => {
                self.recency.move_to_front(slot);
                self.stats.record_hit();
                self.recency.get(slot).map(|entry| entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Touch ==
    /// Marks a key most recently used without reading it.
    ///
    /// Returns false if the key is absent or expired. Hit/miss counters are
    /// left alone.
    pub fn touch(&mut self, key: &str) -> bool {
        match self.live_slot(key) {
            Some(slot) => self.recency.move_to_front(slot),
            None => false,
        }
    }

    // == Peek ==
    /// Reads a live value without affecting recency or statistics.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let now = Instant::now();
        let slot = *self.index.get(key)?;
        self.recency
            .get(slot)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| &entry.value)
    }

    /// Returns true if the key holds a live entry.
    pub fn contains(&self, key: &str) -> bool {
        self.peek(key).is_some()
    }

    // == Remove ==
    /// Removes an entry, cancelling its pending expiry.
    ///
    /// No-op returning None when the key is absent.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.remove_entry(key).map(|entry| entry.value)
    }

    // == Expire Due ==
    /// Removes every entry whose deadline is at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn expire_due(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        for (handle, key) in self.expiry.pop_due(now) {
            let Some(&slot) = self.index.get(&key) else {
                continue;
            };
            // A fired handle always belongs to the live entry, since replacing
            // or removing an entry cancels its handle first.
            if self.recency.get(slot).and_then(|entry| entry.expiry) != Some(handle) {
                continue;
            }
            self.index.remove(&key);
            self.recency.remove(slot);
            self.stats.record_expiration();
            removed += 1;
        }
        self.stats.set_total_entries(self.index.len());
        removed
    }

    // == Next Deadline ==
    /// Earliest pending expiry deadline.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.expiry.next_deadline()
    }

    // == Keys ==
    /// Live keys ordered from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.recency
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect()
    }

    // == Snapshot ==
    /// Owned copies of all live entries, most recently used first.
    pub fn snapshot(&self) -> Vec<SnapshotEntry<V>> {
        let now = Instant::now();
        self.recency
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| SnapshotEntry {
                key: entry.key.clone(),
                value: entry.value.clone(),
                expires_at: entry.expires_at,
            })
            .collect()
    }

    // == Deep Copy ==
    /// Builds an independent store holding the same live entries, in the
    /// same recency order and with the same deadlines.
    ///
    /// The copy walks the list from the tail and pushes each entry to the
    /// head of the new list, so no node of `self` is shared. Expiry handles
    /// are freshly armed in the copy's own scheduler. Statistics start at
    /// zero.
    pub fn deep_copy(&self) -> Self {
        let now = Instant::now();
        let mut copy = Self::empty(self.capacity, self.default_ttl);

        for entry in self.recency.iter_lru() {
            if entry.is_expired_at(now) {
                continue;
            }
            copy.insert_entry(CacheEntry::new(
                entry.key.clone(),
                entry.value.clone(),
                entry.created_at,
                entry.expires_at,
            ));
        }

        copy
    }

    // == Replication Accounting ==
    pub fn record_replicated_write(&mut self) {
        self.stats.record_replicated_write();
    }

    pub fn record_replicated_read(&mut self) {
        self.stats.record_replicated_read();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    // == Introspection ==
    /// Returns the current number of entries, including expired entries
    /// whose timers have not fired yet.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.index.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Slot of a live entry. An expired entry is removed on the way.
    fn live_slot(&mut self, key: &str) -> Option<usize> {
        let slot = *self.index.get(key)?;
        let expired = self
            .recency
            .get(slot)
            .map_or(true, |entry| entry.is_expired_at(Instant::now()));

        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            return None;
        }
        Some(slot)
    }

    fn insert_entry(&mut self, mut entry: CacheEntry<V>) {
        entry.expiry = Some(self.expiry.schedule(&entry.key, entry.expires_at));
        let key = entry.key.clone();
        let slot = self.recency.push_front(entry);
        self.index.insert(key, slot);
        self.stats.set_total_entries(self.index.len());
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let slot = self.index.remove(key)?;
        let entry = self.recency.remove(slot)?;
        if let Some(handle) = entry.expiry {
            self.expiry.cancel(handle);
        }
        self.stats.set_total_entries(self.index.len());
        Some(entry)
    }

    fn evict_lru(&mut self) -> Option<String> {
        let entry = self.recency.pop_back()?;
        self.index.remove(&entry.key);
        if let Some(handle) = entry.expiry {
            self.expiry.cancel(handle);
        }
        self.stats.record_eviction();
        self.stats.set_total_entries(self.index.len());
        Some(entry.key)
    }
}

// == Key Validation ==
/// Rejects empty keys and keys longer than `MAX_KEY_LENGTH` bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
