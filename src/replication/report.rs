//! Fan-out Reports
//!
//! Outcome of propagating one mutation to the other regions.

use serde::Serialize;

use crate::cache::RegionId;
use crate::error::CacheError;

/// Kind of mutation being propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationOp {
    /// A local `put`
    Write,
    /// A local `get` hit
    Read,
}

/// A target region that did not apply the update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub region: RegionId,
    pub error: CacheError,
}

/// Result of one fan-out round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub op: ReplicationOp,
    pub origin: RegionId,
    pub key: String,
    /// Regions that applied the update, in completion order
    pub delivered: Vec<RegionId>,
    pub failures: Vec<DeliveryFailure>,
}

impl FanOutReport {
    pub fn new(op: ReplicationOp, origin: RegionId, key: impl Into<String>) -> Self {
        Self {
            op,
            origin,
            key: key.into(),
            delivered: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of regions the update was sent to.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }

    /// True when every target applied the update.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
