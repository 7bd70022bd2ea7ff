//! Replication Module
//!
//! Keeps regional caches loosely synchronized through a central hub.
//!
//! # Flow
//! A region applies a `put` or a `get` hit locally, then notifies the hub.
//! The hub updates its reference store and applies the same change to every
//! other registered region through their update-only entry points, so the
//! change is never propagated twice. Expiry is not replicated: each region
//! expires entries on its own clock.

mod hub;
mod observer;
mod report;
mod stats;

pub(crate) use hub::HubShared;
pub use hub::{HubConfig, ReplicationHub};
pub use observer::{ReplicationObserver, TracingObserver};
pub use report::{DeliveryFailure, FanOutReport, ReplicationOp};
pub use stats::{HubStats, HubStatsSnapshot};
