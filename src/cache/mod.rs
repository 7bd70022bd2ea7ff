//! Cache Module
//!
//! Provides the regional LRU cache: recency tracking, bounded eviction and
//! per-entry TTL expiry.

use tokio::time::Duration;

mod entry;
mod expiry;
mod lru;
mod region;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use expiry::{ExpiryHandle, ExpiryScheduler};
pub use lru::RecencyList;
pub use region::{RegionId, RegionalCache};
pub use stats::CacheStats;
pub use store::{validate_key, CacheStore, PutOutcome, SnapshotEntry};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes, enforced at the HTTP boundary
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Longest TTL an entry can be given; longer requests are capped
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);
