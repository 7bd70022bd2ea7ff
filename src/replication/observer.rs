//! Replication Observability Hook
//!
//! Fan-out failures never reach the caller of `put`/`get`; they are
//! reported here instead.

use tracing::{debug, warn};

use crate::replication::{DeliveryFailure, FanOutReport};

/// Receives the outcome of every fan-out round.
pub trait ReplicationObserver: Send + Sync {
    /// Called once per target that failed to apply an update.
    fn on_delivery_failure(&self, report: &FanOutReport, failure: &DeliveryFailure);

    /// Called after every round, successful or not.
    fn on_fan_out(&self, _report: &FanOutReport) {}
}

/// Default observer: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ReplicationObserver for TracingObserver {
    fn on_delivery_failure(&self, report: &FanOutReport, failure: &DeliveryFailure) {
        warn!(
            "Replication of {:?} for key '{}' from '{}' to '{}' failed: {}",
            report.op, report.key, report.origin, failure.region, failure.error
        );
    }

    fn on_fan_out(&self, report: &FanOutReport) {
        debug!(
            "Fan-out of {:?} for key '{}' from '{}': {}/{} regions applied",
            report.op,
            report.key,
            report.origin,
            report.delivered.len(),
            report.attempted()
        );
    }
}
