//! Integration Tests for Cross-Region Replication
//!
//! Drives regions and the hub through the public library API only.

use std::time::Duration;

use geo_cache::{
    spawn_expiry_task, CacheError, HubConfig, RegionId, RegionalCache, ReplicationHub,
};

const TTL: Duration = Duration::from_millis(1000);

fn hub() -> ReplicationHub<i64> {
    ReplicationHub::new(HubConfig {
        capacity: 2,
        default_ttl: TTL,
        fanout_timeout: Duration::from_millis(200),
    })
    .unwrap()
}

async fn register(hub: &ReplicationHub<i64>, id: &str) -> RegionalCache<i64> {
    let cache = RegionalCache::new(id, 2, TTL).unwrap();
    hub.register(cache.clone()).await.unwrap();
    cache
}

#[tokio::test]
async fn test_scenario_replicated_to_every_region() {
    let hub = hub();
    let east = register(&hub, "us-east").await;
    let west = register(&hub, "eu-west").await;

    east.put("k1", 1, None).await.unwrap();
    east.put("k2", 2, None).await.unwrap();
    assert_eq!(east.get("k1").await, Some(1));
    east.put("k3", 3, None).await.unwrap();

    // The read of k1 was replayed in eu-west, so both evicted k2
    for region in [&east, &west] {
        let mut entries: Vec<_> = region
            .snapshot()
            .await
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect();
        entries.sort();
        assert_eq!(
            entries,
            vec![("k1".to_string(), 1), ("k3".to_string(), 3)],
            "region {}",
            region.id()
        );
    }
}

#[tokio::test]
async fn test_last_write_wins() {
    let hub = hub();
    let east = register(&hub, "us-east").await;
    let west = register(&hub, "eu-west").await;

    east.put("k", 1, None).await.unwrap();
    west.put("k", 2, None).await.unwrap();

    assert_eq!(east.get("k").await, Some(2));
    assert_eq!(west.get("k").await, Some(2));
}

#[tokio::test]
async fn test_duplicate_register_conflicts() {
    let hub = hub();
    register(&hub, "us-east").await;

    let again = RegionalCache::new("us-east", 2, TTL).unwrap();
    assert!(matches!(
        hub.register(again).await,
        Err(CacheError::Conflict(_))
    ));
    assert!(hub.unregister(&RegionId::from("unknown")).await.is_none());
}

#[tokio::test]
async fn test_late_joiner_is_independent() {
    let hub = hub();
    let east = register(&hub, "us-east").await;
    east.put("a", 1, None).await.unwrap();

    let south = hub.join("ap-south").await.unwrap();
    assert_eq!(south.get("a").await, Some(1));

    south.remove("a").await;
    assert_eq!(east.get("a").await, Some(1));
    assert_eq!(south.get("a").await, None);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_is_per_region() {
    let hub = hub();
    let east = register(&hub, "us-east").await;
    let west = register(&hub, "eu-west").await;
    let east_task = spawn_expiry_task(east.clone());
    let west_task = spawn_expiry_task(west.clone());

    east.put("k", 1, Some(Duration::from_millis(500))).await.unwrap();
    assert!(west.contains("k").await);

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(east.keys().await, Vec::<String>::new());
    assert_eq!(west.keys().await, Vec::<String>::new());
    assert_eq!(east.stats().await.expirations, 1);
    assert_eq!(west.stats().await.expirations, 1);

    east_task.abort();
    west_task.abort();
}
