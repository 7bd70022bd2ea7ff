//! TTL Expiry Task
//!
//! Background task that removes a region's entries as their deadlines pass.

use tokio::task::JoinHandle;
use tokio::time::sleep_until;
use tracing::info;

use crate::cache::RegionalCache;

/// Spawns the expiry driver for one region.
///
/// The task sleeps until the region's earliest pending deadline, removes
/// every due entry under the region lock, and repeats. A write that arms an
/// earlier deadline wakes it early. The task ends when the region is
/// closed; otherwise abort it through the returned handle on shutdown.
///
/// # Example
/// ```ignore
/// let cache = RegionalCache::new("us-east", 1000, Duration::from_secs(300))?;
/// let expiry_handle = spawn_expiry_task(cache.clone());
/// // Later, during shutdown:
/// expiry_handle.abort();
/// ```
pub fn spawn_expiry_task<V>(cache: RegionalCache<V>) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiry task for region '{}'", cache.id());

        while !cache.is_closed() {
            match cache.expire_due().await {
                Some(deadline) => {
                    tokio::select! {
                        _ = sleep_until(deadline) => {}
                        _ = cache.expiry_wakeup().notified() => {}
                    }
                }
                None => cache.expiry_wakeup().notified().await,
            }
        }

        info!("Expiry task for region '{}' stopped", cache.id());
    })
}
