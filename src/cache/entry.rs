//! Cache Entry Module
//!
//! Defines the record stored for every key of a regional cache.

use tokio::time::Instant;

use crate::cache::ExpiryHandle;

// == Cache Entry ==
/// A single cache record.
///
/// Recency links are not stored here: the entry lives inside a node of the
/// region's [`RecencyList`](crate::cache::RecencyList), which owns its
/// position. The entry only owns its key, value and pending expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key this entry is indexed under
    pub key: String,
    /// The stored value
    pub value: V,
    /// When the entry was written
    pub created_at: Instant,
    /// Deadline after which the entry is no longer visible
    pub expires_at: Instant,
    /// Pending scheduled removal, if armed
    pub expiry: Option<ExpiryHandle>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an unarmed entry written at `created_at` that expires at
    /// `expires_at`.
    pub fn new(key: String, value: V, created_at: Instant, expires_at: Instant) -> Self {
        Self {
            key,
            value,
            created_at,
            expires_at,
            expiry: None,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// An entry is expired once `now` reaches its deadline, so a TTL of T is
    /// visible for every query strictly before T has elapsed.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
