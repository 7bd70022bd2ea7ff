//! Replication Statistics
//!
//! Lock-free counters for hub fan-out activity.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::CacheError;
use crate::replication::{FanOutReport, ReplicationOp};

/// Hub counters, updated once per fan-out round.
#[derive(Debug, Default)]
pub struct HubStats {
    writes_propagated: AtomicU64,
    reads_propagated: AtomicU64,
    deliveries: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

/// Point-in-time copy of [`HubStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStatsSnapshot {
    /// Local writes reported by regions
    pub writes_propagated: u64,
    /// Local read hits reported by regions
    pub reads_propagated: u64,
    /// Updates applied by target regions
    pub deliveries: u64,
    /// Updates a target failed to apply, timeouts included
    pub failures: u64,
    /// Updates abandoned after the fan-out timeout
    pub timeouts: u64,
}

impl HubStats {
    pub fn record(&self, report: &FanOutReport) {
        match report.op {
            ReplicationOp::Write => self.writes_propagated.fetch_add(1, Ordering::Relaxed),
            ReplicationOp::Read => self.reads_propagated.fetch_add(1, Ordering::Relaxed),
        };
        self.deliveries
            .fetch_add(report.delivered.len() as u64, Ordering::Relaxed);
        self.failures
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);

        let timeouts = report
            .failures
            .iter()
            .filter(|failure| matches!(failure.error, CacheError::ReplicationTimeout(_)))
            .count();
        self.timeouts.fetch_add(timeouts as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HubStatsSnapshot {
        HubStatsSnapshot {
            writes_propagated: self.writes_propagated.load(Ordering::Relaxed),
            reads_propagated: self.reads_propagated.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}
