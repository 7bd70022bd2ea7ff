//! Response DTOs for the regional cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, RegionId};

/// Response body for GET /regions/:region/get/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// Region that served the read
    pub region: RegionId,
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    pub fn new(region: RegionId, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            region,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for PUT /regions/:region/set
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// Region that accepted the write
    pub region: RegionId,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(region: RegionId, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully in region '{}'", key, region),
            region,
            key,
        }
    }
}

/// Response body for DELETE /regions/:region/del/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for GET /regions/:region/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub region: RegionId,
    /// Maximum number of entries
    pub capacity: usize,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Number of TTL expirations
    pub expirations: u64,
    /// Writes applied on behalf of other regions
    pub replicated_writes: u64,
    /// Recency bumps applied on behalf of other regions
    pub replicated_reads: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(region: RegionId, capacity: usize, stats: &CacheStats) -> Self {
        Self {
            region,
            capacity,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            replicated_writes: stats.replicated_writes,
            replicated_reads: stats.replicated_reads,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// One row of GET /regions
#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub region: RegionId,
    pub entries: usize,
    pub capacity: usize,
}

/// Response body for GET /regions
#[derive(Debug, Clone, Serialize)]
pub struct RegionsResponse {
    pub regions: Vec<RegionSummary>,
}

/// Response body for POST /regions/:region
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub message: String,
    pub region: RegionId,
    /// Entries copied from hub state
    pub entries: usize,
}

impl JoinResponse {
    pub fn new(region: RegionId, entries: usize) -> Self {
        Self {
            message: format!("Region '{}' joined with {} entries", region, entries),
            region,
            entries,
        }
    }
}

/// Response body for DELETE /regions/:region
#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub message: String,
    pub region: RegionId,
}

impl LeaveResponse {
    pub fn new(region: RegionId) -> Self {
        Self {
            message: format!("Region '{}' unregistered", region),
            region,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Number of registered regions
    pub regions: usize,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(regions: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            regions,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
