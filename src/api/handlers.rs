//! API Handlers
//!
//! HTTP request handlers mapping each endpoint onto a region or the hub.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{RegionId, RegionalCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, JoinResponse, LeaveResponse, RegionSummary,
    RegionsResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::replication::{HubStatsSnapshot, ReplicationHub};
use crate::tasks::spawn_expiry_task;

/// Application state shared across all handlers.
///
/// Holds the hub (and through it every region) plus the expiry task of
/// each region it started, keyed by region, so leave and shutdown can stop
/// them.
#[derive(Clone)]
pub struct AppState {
    /// Registry of all regions
    pub hub: ReplicationHub,
    expiry_tasks: Arc<Mutex<HashMap<RegionId, JoinHandle<()>>>>,
}

impl AppState {
    /// Creates a new AppState around an existing hub.
    pub fn new(hub: ReplicationHub) -> Self {
        Self {
            hub,
            expiry_tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Builds the hub and the startup regions from configuration, with an
    /// expiry task per region.
    ///
    /// # Errors
    /// `CacheError::Config` on invalid settings, `CacheError::Conflict` on
    /// duplicate region ids.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let state = Self::new(ReplicationHub::new(config.hub_config())?);

        for region in &config.regions {
            let cache = RegionalCache::new(region.as_str(), config.capacity, config.default_ttl())?;
            state.hub.register(cache.clone()).await?;
            state.track(&cache).await;
        }

        Ok(state)
    }

    /// Aborts every expiry task started through this state.
    pub async fn shutdown(&self) {
        let mut tasks = self.expiry_tasks.lock().await;
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }

    async fn track(&self, cache: &RegionalCache) {
        let task = spawn_expiry_task(cache.clone());
        let mut tasks = self.expiry_tasks.lock().await;
        if let Some(previous) = tasks.insert(cache.id().clone(), task) {
            previous.abort();
        }
    }

    async fn untrack(&self, region: &RegionId) {
        if let Some(task) = self.expiry_tasks.lock().await.remove(region) {
            task.abort();
        }
    }

    async fn region(&self, region: &str) -> Result<RegionalCache> {
        self.hub
            .region(&RegionId::from(region))
            .await
            .ok_or_else(|| CacheError::RegionNotFound(region.to_string()))
    }
}

/// Handler for PUT /regions/:region/set
///
/// Stores a key-value pair in the region; the write is replicated to the
/// other regions.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let cache = state.region(&region).await?;
    let ttl = req.ttl();
    cache.put(req.key.clone(), req.value, ttl).await?;

    Ok(Json(SetResponse::new(cache.id().clone(), req.key)))
}

/// Handler for GET /regions/:region/get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((region, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let cache = state.region(&region).await?;
    let value = cache
        .get(&key)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(cache.id().clone(), key, value)))
}

/// Handler for DELETE /regions/:region/del/:key
///
/// Removal is local to the region.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((region, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let cache = state.region(&region).await?;
    cache
        .remove(&key)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /regions/:region/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<StatsResponse>> {
    let cache = state.region(&region).await?;
    cache.purge_expired().await;
    let stats = cache.stats().await;

    Ok(Json(StatsResponse::new(
        cache.id().clone(),
        cache.capacity(),
        &stats,
    )))
}

/// Handler for GET /regions
pub async fn list_regions_handler(State(state): State<AppState>) -> Json<RegionsResponse> {
    let mut regions = Vec::new();
    for id in state.hub.region_ids().await {
        if let Some(cache) = state.hub.region(&id).await {
            regions.push(RegionSummary {
                entries: cache.size().await,
                capacity: cache.capacity(),
                region: id,
            });
        }
    }

    Json(RegionsResponse { regions })
}

/// Handler for POST /regions/:region
///
/// Adds a region bootstrapped from the hub's current entries.
pub async fn join_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<JoinResponse>> {
    let cache = state.hub.join(region.as_str()).await?;
    state.track(&cache).await;

    info!("Region '{}' joined through the API", cache.id());
    Ok(Json(JoinResponse::new(
        cache.id().clone(),
        cache.size().await,
    )))
}

/// Handler for DELETE /regions/:region
///
/// Unregisters the region and closes it, which also stops its expiry task.
pub async fn leave_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<LeaveResponse>> {
    let id = RegionId::from(region.as_str());
    let cache = state
        .hub
        .unregister(&id)
        .await
        .ok_or_else(|| CacheError::RegionNotFound(region.clone()))?;
    cache.close();
    state.untrack(&id).await;

    Ok(Json(LeaveResponse::new(id)))
}

/// Handler for GET /replication/stats
pub async fn replication_stats_handler(State(state): State<AppState>) -> Json<HubStatsSnapshot> {
    Json(state.hub.stats())
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.hub.len().await))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_state() -> AppState {
        let config = Config {
            regions: vec!["us-east".to_string(), "eu-west".to_string()],
            ..Config::default()
        };
        AppState::from_config(&config).await.unwrap()
    }

    fn set_request(key: &str, value: &str) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: value.to_string(),
            ttl_ms: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state().await;

        let result = set_handler(
            State(state.clone()),
            Path("us-east".to_string()),
            Json(set_request("test_key", "test_value")),
        )
        .await;
        assert!(result.is_ok());

        // Replicated to the other region
        let response = get_handler(
            State(state.clone()),
            Path(("eu-west".to_string(), "test_key".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(response.value, "test_value");
        assert_eq!(response.region.as_str(), "eu-west");

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state().await;

        let result = get_handler(
            State(state),
            Path(("us-east".to_string(), "nonexistent".to_string())),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_region() {
        let state = test_state().await;

        let result = set_handler(
            State(state),
            Path("mars".to_string()),
            Json(set_request("k", "v")),
        )
        .await;
        assert!(matches!(result, Err(CacheError::RegionNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_local() {
        let state = test_state().await;

        let set = set_handler(
            State(state.clone()),
            Path("us-east".to_string()),
            Json(set_request("to_delete", "value")),
        )
        .await
        .unwrap();
        assert_eq!(set.key, "to_delete");

        let result = delete_handler(
            State(state.clone()),
            Path(("us-east".to_string(), "to_delete".to_string())),
        )
        .await;
        assert!(result.is_ok());

        let result = get_handler(
            State(state.clone()),
            Path(("eu-west".to_string(), "to_delete".to_string())),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_join_and_leave_handlers() {
        let state = test_state().await;

        let _response = set_handler(
            State(state.clone()),
            Path("us-east".to_string()),
            Json(set_request("k", "v")),
        )
        .await
        .unwrap();

        let joined = join_handler(State(state.clone()), Path("ap-south".to_string()))
            .await
            .unwrap();
        assert_eq!(joined.entries, 1);
        assert_eq!(state.expiry_tasks.lock().await.len(), 3);

        let result = join_handler(State(state.clone()), Path("ap-south".to_string())).await;
        assert!(matches!(result, Err(CacheError::Conflict(_))));

        let left = leave_handler(State(state.clone()), Path("ap-south".to_string())).await;
        assert!(left.is_ok());
        assert_eq!(state.expiry_tasks.lock().await.len(), 2);
        let result = leave_handler(State(state.clone()), Path("ap-south".to_string())).await;
        assert!(matches!(result, Err(CacheError::RegionNotFound(_))));

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_stats_handlers() {
        let state = test_state().await;

        let response = stats_handler(State(state.clone()), Path("us-east".to_string()))
            .await
            .unwrap();
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.capacity, 1000);

        let hub_stats = replication_stats_handler(State(state.clone())).await;
        assert_eq!(hub_stats.writes_propagated, 0);

        let regions = list_regions_handler(State(state.clone())).await;
        assert_eq!(regions.regions.len(), 2);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = test_state().await;
        let response = health_handler(State(state)).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.regions, 2);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state().await;

        let result = set_handler(
            State(state),
            Path("us-east".to_string()),
            Json(set_request("", "value")),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
