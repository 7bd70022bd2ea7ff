//! Regional Cache Module
//!
//! A shareable handle to one region's store. The store sits behind the
//! region's own lock, so local calls, replicated updates and expiry are
//! serialized per region while different regions never contend.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock};
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::cache::{CacheStats, CacheStore, SnapshotEntry};
use crate::error::{CacheError, Result};
use crate::replication::{HubShared, ReplicationHub};

// == Region Id ==
/// Identifier of a region, unique within a hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// == Regional Cache ==
/// Handle to a region's bounded, TTL-aware LRU cache.
///
/// Cloning the handle shares the region. When registered with a
/// [`ReplicationHub`], successful local writes and read hits are reported
/// to it; the hub applies them to the other regions through the
/// update-only entry points, which never report back.
pub struct RegionalCache<V = String> {
    inner: Arc<RegionInner<V>>,
}

struct RegionInner<V> {
    id: RegionId,
    capacity: usize,
    default_ttl: Duration,
    store: RwLock<CacheStore<V>>,
    hub: RwLock<Option<Weak<HubShared<V>>>>,
    expiry_wakeup: Notify,
    closed: AtomicBool,
}

impl<V> Clone for RegionalCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for RegionalCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionalCache")
            .field("id", &self.inner.id)
            .field("capacity", &self.inner.capacity)
            .field("default_ttl", &self.inner.default_ttl)
            .field("closed", &self.inner.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl<V> RegionalCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty region.
    ///
    /// # Errors
    /// `CacheError::Config` if `capacity` or `default_ttl` is zero.
    pub fn new(id: impl Into<RegionId>, capacity: usize, default_ttl: Duration) -> Result<Self> {
        let store = CacheStore::new(capacity, default_ttl)?;
        Ok(Self::from_store(id, store))
    }

    /// Wraps an existing store, e.g. one bootstrapped from hub state.
    pub fn from_store(id: impl Into<RegionId>, store: CacheStore<V>) -> Self {
        Self {
            inner: Arc::new(RegionInner {
                id: id.into(),
                capacity: store.capacity(),
                default_ttl: store.default_ttl(),
                store: RwLock::new(store),
                hub: RwLock::new(None),
                expiry_wakeup: Notify::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &RegionId {
        &self.inner.id
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    // == Get ==
    /// Looks up a key, marking it most recently used on a hit.
    ///
    /// A hit is reported to the hub so the other regions bump the same key.
    pub async fn get(&self, key: &str) -> Option<V> {
        let value = self.inner.store.write().await.get(key);

        match &value {
            Some(_) => {
                debug!("Region '{}': hit for key '{}'", self.inner.id, key);
                if let Some(hub) = self.hub().await {
                    hub.notify_read(&self.inner.id, key).await;
                }
            }
            None => debug!("Region '{}': miss for key '{}'", self.inner.id, key),
        }

        value
    }

    // == Put ==
    /// Stores a value locally, then reports the write to the hub.
    ///
    /// `ttl` of `None` or zero uses the region's default TTL. Replication
    /// failures are handled by the hub and never fail the local write.
    ///
    /// # Errors
    /// `CacheError::InvalidRequest` if the key is invalid.
    pub async fn put(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<()> {
        let key = key.into();

        match self.hub().await {
            Some(hub) => {
                self.store_local(key.clone(), value.clone(), ttl).await?;
                hub.notify_write(&self.inner.id, key, value, ttl).await;
            }
            None => self.store_local(key, value, ttl).await?,
        }

        Ok(())
    }

    // == Remove ==
    /// Removes a key from this region only. No-op when absent.
    pub async fn remove(&self, key: &str) -> Option<V> {
        let removed = self.inner.store.write().await.remove(key);
        if removed.is_some() {
            debug!("Region '{}': removed key '{}'", self.inner.id, key);
        }
        removed
    }

    // == Update-Only Application ==
    /// Applies a write on behalf of another region without reporting it.
    ///
    /// # Errors
    /// `CacheError::RegionClosed` once the region is closed, or
    /// `CacheError::InvalidRequest` if the key is invalid.
    pub async fn apply_update(&self, key: String, value: V, ttl: Option<Duration>) -> Result<()> {
        self.ensure_open()?;
        {
            let mut store = self.inner.store.write().await;
            store.put(key, value, ttl)?;
            store.record_replicated_write();
        }
        self.inner.expiry_wakeup.notify_one();
        Ok(())
    }

    /// Applies a recency bump on behalf of another region without
    /// reporting it. Returns whether the key was present.
    ///
    /// # Errors
    /// `CacheError::RegionClosed` once the region is closed.
    pub async fn apply_touch(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        let mut store = self.inner.store.write().await;
        let touched = store.touch(key);
        if touched {
            store.record_replicated_read();
        }
        Ok(touched)
    }

    // == Introspection ==
    /// Number of live entries. Entries whose deadline has passed are purged
    /// first.
    pub async fn size(&self) -> usize {
        let mut store = self.inner.store.write().await;
        store.expire_due(Instant::now());
        store.len()
    }

    /// Removes every entry whose deadline has passed without waiting for
    /// the expiry task. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let removed = self.inner.store.write().await.expire_due(Instant::now());
        if removed > 0 {
            debug!("Region '{}': purged {} expired entries", self.inner.id, removed);
        }
        removed
    }

    pub async fn is_full(&self) -> bool {
        self.size().await >= self.inner.capacity
    }

    /// Checks for a live entry without touching recency.
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.store.read().await.contains(key)
    }

    /// Keys from most to least recently used.
    pub async fn keys(&self) -> Vec<String> {
        self.inner.store.read().await.keys()
    }

    pub async fn snapshot(&self) -> Vec<SnapshotEntry<V>> {
        self.inner.store.read().await.snapshot()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.store.read().await.stats()
    }

    // == Lifecycle ==
    /// Stops accepting replicated updates and stops the expiry task.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.expiry_wakeup.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Returns true while registered with a live hub.
    pub async fn is_attached(&self) -> bool {
        self.hub().await.is_some()
    }

    // == Expiry ==
    /// Removes due entries and returns the next pending deadline.
    pub(crate) async fn expire_due(&self) -> Option<Instant> {
        let mut store = self.inner.store.write().await;
        let removed = store.expire_due(Instant::now());
        if removed > 0 {
            debug!(
                "Region '{}': expired {} entries",
                self.inner.id, removed
            );
        }
        store.next_deadline()
    }

    pub(crate) fn expiry_wakeup(&self) -> &Notify {
        &self.inner.expiry_wakeup
    }

    // == Hub Link ==
    pub(crate) async fn attach(&self, hub: Weak<HubShared<V>>) -> Result<()> {
        let mut link = self.inner.hub.write().await;
        if let Some(existing) = link.as_ref() {
            if existing.strong_count() > 0 && !existing.ptr_eq(&hub) {
                return Err(CacheError::Conflict(format!(
                    "region '{}' is already registered with another hub",
                    self.inner.id
                )));
            }
        }
        *link = Some(hub);
        Ok(())
    }

    pub(crate) async fn detach(&self) {
        *self.inner.hub.write().await = None;
    }

    async fn hub(&self) -> Option<ReplicationHub<V>> {
        let link = self.inner.hub.read().await;
        link.as_ref()
            .and_then(Weak::upgrade)
            .map(ReplicationHub::from_shared)
    }

    async fn store_local(&self, key: String, value: V, ttl: Option<Duration>) -> Result<()> {
        let outcome = self.inner.store.write().await.put(key, value, ttl)?;
        if let Some(evicted) = outcome.evicted {
            debug!(
                "Region '{}': evicted least recently used key '{}'",
                self.inner.id, evicted
            );
        }
        self.inner.expiry_wakeup.notify_one();
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(CacheError::RegionClosed(self.inner.id.to_string()));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn lock_store(&self) -> tokio::sync::RwLockWriteGuard<'_, CacheStore<V>> {
        self.inner.store.write().await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(1000);

    fn region(id: &str, capacity: usize) -> RegionalCache<i32> {
        RegionalCache::new(id, capacity, TTL).unwrap()
    }

    #[test]
    fn test_region_rejects_bad_config() {
        assert!(matches!(
            RegionalCache::<i32>::new("r", 0, TTL),
            Err(CacheError::Config(_))
        ));
        assert!(matches!(
            RegionalCache::<i32>::new("r", 1, Duration::ZERO),
            Err(CacheError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_region_concrete_scenario() {
        let cache = region("us-east", 2);

        cache.put("k1", 1, None).await.unwrap();
        cache.put("k2", 2, None).await.unwrap();
        assert_eq!(cache.get("k1").await, Some(1));
        cache.put("k3", 3, None).await.unwrap();

        assert!(!cache.contains("k2").await);
        assert_eq!(cache.keys().await, vec!["k3", "k1"]);
        assert_eq!(cache.size().await, 2);
        assert!(cache.is_full().await);
    }

    #[tokio::test]
    async fn test_region_capacity_plus_one() {
        let cache = region("us-east", 3);
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.put(*key, i as i32, None).await.unwrap();
        }

        assert!(!cache.contains("a").await);
        for key in ["b", "c", "d"] {
            assert!(cache.contains(key).await);
        }
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_region_remove() {
        let cache = region("us-east", 2);
        cache.put("k", 1, None).await.unwrap();

        assert_eq!(cache.remove("k").await, Some(1));
        assert_eq!(cache.remove("k").await, None);
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_ttl_visibility() {
        let cache = region("us-east", 4);
        cache
            .put("k", 1, Some(Duration::from_millis(500)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(499)).await;
        assert_eq!(cache.get("k").await, Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.size().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_size_purges_expired() {
        let cache = region("us-east", 4);
        cache.put("short", 1, Some(Duration::from_millis(100))).await.unwrap();
        cache.put("default", 2, None).await.unwrap();

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.size().await, 1);
        assert_eq!(cache.stats().await.expirations, 1);
    }

    #[tokio::test]
    async fn test_apply_update_counts_replicated_write() {
        let cache = region("eu-west", 2);
        cache.apply_update("k".to_string(), 9, None).await.unwrap();

        assert_eq!(cache.get("k").await, Some(9));
        let stats = cache.stats().await;
        assert_eq!(stats.replicated_writes, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_apply_touch() {
        let cache = region("eu-west", 2);
        cache.put("a", 1, None).await.unwrap();
        cache.put("b", 2, None).await.unwrap();

        assert!(cache.apply_touch("a").await.unwrap());
        assert!(!cache.apply_touch("missing").await.unwrap());
        assert_eq!(cache.keys().await, vec!["a", "b"]);
        assert_eq!(cache.stats().await.replicated_reads, 1);
    }

    #[tokio::test]
    async fn test_closed_region_rejects_replicated_updates() {
        let cache = region("eu-west", 2);
        cache.close();

        assert!(cache.is_closed());
        assert_eq!(
            cache.apply_update("k".to_string(), 1, None).await,
            Err(CacheError::RegionClosed("eu-west".to_string()))
        );
        assert!(matches!(
            cache.apply_touch("k").await,
            Err(CacheError::RegionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_unattached_region() {
        let cache = region("ap-south", 2);
        assert!(!cache.is_attached().await);
        assert_eq!(cache.id().as_str(), "ap-south");
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.default_ttl(), TTL);
    }

    #[test]
    fn test_region_debug_output() {
        let cache = region("us-east", 2);
        cache.close();

        let debug = format!("{:?}", cache);
        assert!(debug.contains("us-east"));
        assert!(debug.contains("closed: true"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = region("us-east", 4);
        cache.put("short", 1, Some(Duration::from_millis(100))).await.unwrap();
        cache.put("long", 2, None).await.unwrap();

        assert_eq!(cache.purge_expired().await, 0);
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.stats().await.total_entries, 1);
    }

    #[tokio::test]
    async fn test_region_put_with_huge_ttl() {
        let cache = region("us-east", 2);

        cache.put("k", 1, Some(Duration::MAX)).await.unwrap();
        cache.apply_update("j".to_string(), 2, Some(Duration::MAX)).await.unwrap();

        assert_eq!(cache.get("k").await, Some(1));
        assert_eq!(cache.get("j").await, Some(2));
    }

    #[test]
    fn test_region_id_display_and_serde() {
        let id = RegionId::from("us-east");
        assert_eq!(id.to_string(), "us-east");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"us-east\"");
    }
}
