//! Replication Hub
//!
//! Registry of regions that fans local writes and read hits out to every
//! other region.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::cache::{CacheStore, RegionId, RegionalCache, SnapshotEntry};
use crate::error::{CacheError, Result};
use crate::replication::{
    DeliveryFailure, FanOutReport, HubStats, HubStatsSnapshot, ReplicationObserver,
    ReplicationOp, TracingObserver,
};

type Registry<V> = HashMap<RegionId, RegionalCache<V>>;

// == Hub Config ==
/// Parameters of the hub's reference store and fan-out.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of the reference store and of regions joined through it
    pub capacity: usize,
    /// Default TTL of the reference store and of joined regions
    pub default_ttl: Duration,
    /// Longest a single target may take to apply an update
    pub fanout_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            default_ttl: Duration::from_secs(300),
            fanout_timeout: Duration::from_millis(250),
        }
    }
}

// == Replication Hub ==
/// Central registry that keeps regions loosely synchronized.
///
/// The hub keeps its own reference store, updated by every propagated
/// write and read, from which late-joining regions are bootstrapped.
/// Replication is best-effort and last-write-wins. The hub itself is not
/// replicated: if it goes away, regions keep serving locally and stop
/// synchronizing.
pub struct ReplicationHub<V = String> {
    shared: Arc<HubShared<V>>,
}

pub(crate) struct HubShared<V> {
    regions: RwLock<Registry<V>>,
    reference: Mutex<CacheStore<V>>,
    fanout_timeout: Duration,
    stats: HubStats,
    observer: Arc<dyn ReplicationObserver>,
}

impl<V> Clone for ReplicationHub<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> ReplicationHub<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a hub that reports fan-out failures through `tracing`.
    ///
    /// # Errors
    /// `CacheError::Config` if capacity, default TTL or fan-out timeout is
    /// zero.
    pub fn new(config: HubConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Creates a hub with a custom observability hook.
    pub fn with_observer(config: HubConfig, observer: Arc<dyn ReplicationObserver>) -> Result<Self> {
        if config.fanout_timeout.is_zero() {
            return Err(CacheError::Config(
                "fan-out timeout must be greater than zero".to_string(),
            ));
        }
        let reference = CacheStore::new(config.capacity, config.default_ttl)?;

        Ok(Self {
            shared: Arc::new(HubShared {
                regions: RwLock::new(HashMap::new()),
                reference: Mutex::new(reference),
                fanout_timeout: config.fanout_timeout,
                stats: HubStats::default(),
                observer,
            }),
        })
    }

    pub(crate) fn from_shared(shared: Arc<HubShared<V>>) -> Self {
        Self { shared }
    }

    // == Register ==
    /// Adds a region under its own id and links it to this hub.
    ///
    /// # Errors
    /// `CacheError::Conflict` if the id is already registered, or the
    /// region is attached to another live hub.
    pub async fn register(&self, cache: RegionalCache<V>) -> Result<()> {
        let mut regions = self.shared.regions.write().await;
        self.insert_region(&mut regions, cache).await
    }

    // == Join ==
    /// Creates a region bootstrapped from the reference store and
    /// registers it.
    ///
    /// The registry stays locked while the reference store is copied, so a
    /// concurrent write is either part of the copy or fanned out to the new
    /// region afterwards.
    ///
    /// # Errors
    /// `CacheError::Conflict` if the id is already registered.
    pub async fn join(&self, region_id: impl Into<RegionId>) -> Result<RegionalCache<V>> {
        let id = region_id.into();
        let mut regions = self.shared.regions.write().await;
        if regions.contains_key(&id) {
            return Err(conflict(&id));
        }

        let store = self.shared.reference.lock().await.deep_copy();
        let entries = store.len();
        let cache = RegionalCache::from_store(id, store);
        self.insert_region(&mut regions, cache.clone()).await?;

        info!(
            "Region '{}' bootstrapped with {} entries from hub state",
            cache.id(),
            entries
        );
        Ok(cache)
    }

    // == Unregister ==
    /// Removes a region and unlinks it from the hub.
    ///
    /// Returns the removed handle; unknown ids are a no-op.
    pub async fn unregister(&self, region_id: &RegionId) -> Option<RegionalCache<V>> {
        let removed = self.shared.regions.write().await.remove(region_id);
        if let Some(cache) = &removed {
            cache.detach().await;
            info!("Region '{}' unregistered", region_id);
        }
        removed
    }

    // == Lookup ==
    pub async fn region(&self, region_id: &RegionId) -> Option<RegionalCache<V>> {
        self.shared.regions.read().await.get(region_id).cloned()
    }

    /// Registered ids in sorted order.
    pub async fn region_ids(&self) -> Vec<RegionId> {
        let mut ids: Vec<_> = self.shared.regions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.shared.regions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shared.regions.read().await.is_empty()
    }

    // == Reference Store ==
    pub async fn reference_len(&self) -> usize {
        self.shared.reference.lock().await.len()
    }

    pub async fn reference_snapshot(&self) -> Vec<SnapshotEntry<V>> {
        self.shared.reference.lock().await.snapshot()
    }

    pub fn stats(&self) -> HubStatsSnapshot {
        self.shared.stats.snapshot()
    }

    // == Notify Write ==
    /// Propagates a local write from `origin`.
    ///
    /// The reference store is updated first, then every other region
    /// applies the write without propagating it further. The origin is
    /// never written to.
    pub async fn notify_write(
        &self,
        origin: &RegionId,
        key: String,
        value: V,
        ttl: Option<Duration>,
    ) -> FanOutReport {
        if let Err(error) = self
            .shared
            .reference
            .lock()
            .await
            .put(key.clone(), value.clone(), ttl)
        {
            warn!("Hub reference store rejected key '{}': {}", key, error);
        }

        let targets = self.targets(origin).await;
        let fan_out_key = key.clone();
        self.fan_out(ReplicationOp::Write, origin, &fan_out_key, targets, move |cache| {
            let key = key.clone();
            let value = value.clone();
            async move { cache.apply_update(key, value, ttl).await }
        })
        .await
    }

    // == Notify Read ==
    /// Propagates a local read hit from `origin` as a recency bump.
    ///
    /// Regions that do not hold the key are left untouched.
    pub async fn notify_read(&self, origin: &RegionId, key: &str) -> FanOutReport {
        self.shared.reference.lock().await.touch(key);

        let targets = self.targets(origin).await;
        let owned_key = key.to_string();
        self.fan_out(ReplicationOp::Read, origin, key, targets, move |cache| {
            let key = owned_key.clone();
            async move { cache.apply_touch(&key).await.map(|_| ()) }
        })
        .await
    }

    async fn insert_region(
        &self,
        regions: &mut RwLockWriteGuard<'_, Registry<V>>,
        cache: RegionalCache<V>,
    ) -> Result<()> {
        let id = cache.id().clone();
        if regions.contains_key(&id) {
            return Err(conflict(&id));
        }

        cache.attach(Arc::downgrade(&self.shared)).await?;
        regions.insert(id.clone(), cache);
        info!("Region '{}' registered ({} regions)", id, regions.len());
        Ok(())
    }

    /// Snapshot of every registered region except `origin`.
    async fn targets(&self, origin: &RegionId) -> Vec<RegionalCache<V>> {
        self.shared
            .regions
            .read()
            .await
            .iter()
            .filter(|(id, _)| *id != origin)
            .map(|(_, cache)| cache.clone())
            .collect()
    }

    /// Delivers one update to every target concurrently.
    ///
    /// Each delivery runs in its own task bounded by the fan-out timeout,
    /// so a stuck, closed or panicking region only costs its own slot in
    /// the report.
    async fn fan_out<F, Fut>(
        &self,
        op: ReplicationOp,
        origin: &RegionId,
        key: &str,
        targets: Vec<RegionalCache<V>>,
        apply: F,
    ) -> FanOutReport
    where
        F: Fn(RegionalCache<V>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let timeout = self.shared.fanout_timeout;
        let pending: Vec<(RegionId, JoinHandle<Result<()>>)> = targets
            .into_iter()
            .map(|cache| {
                let region = cache.id().clone();
                let delivery = apply(cache);
                let handle = tokio::spawn(async move {
                    match tokio::time::timeout(timeout, delivery).await {
                        Ok(result) => result,
                        Err(_) => Err(CacheError::ReplicationTimeout(format!(
                            "no acknowledgement within {:?}",
                            timeout
                        ))),
                    }
                });
                (region, handle)
            })
            .collect();

        let mut report = FanOutReport::new(op, origin.clone(), key);
        for (region, handle) in pending {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(CacheError::Internal(format!(
                    "delivery task failed: {}",
                    join_error
                ))),
            };
            match outcome {
                Ok(()) => report.delivered.push(region),
                Err(error) => report.failures.push(DeliveryFailure { region, error }),
            }
        }

        self.shared.stats.record(&report);
        for failure in &report.failures {
            self.shared.observer.on_delivery_failure(&report, failure);
        }
        self.shared.observer.on_fan_out(&report);
        report
    }
}

fn conflict(id: &RegionId) -> CacheError {
    CacheError::Conflict(format!("region '{}' is already registered", id))
}
