//! Geo Cache - A regional LRU cache with cross-region replication
//!
//! Each region is a capacity-bounded LRU cache with per-entry TTL expiry.
//! A replication hub fans writes and read hits out to the other regions on
//! a best-effort, last-write-wins basis.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod replication;
pub mod tasks;

pub use api::AppState;
pub use cache::{RegionId, RegionalCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use replication::{HubConfig, ReplicationHub};
pub use tasks::spawn_expiry_task;
