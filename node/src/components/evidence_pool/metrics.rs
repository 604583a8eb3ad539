use prometheus::{IntCounter, IntGauge, Registry};

use crate::unregister_metric;

/// Metrics for the evidence pool.
#[derive(Debug)]
pub(super) struct Metrics {
    /// Number of evidence items pending inclusion in a block.
    pub(super) pending: IntGauge,
    /// Number of committed markers written.
    pub(super) committed: IntCounter,
    /// Number of pending items pruned because they expired.
    pub(super) expired: IntCounter,
    /// Number of evidence items rejected as invalid.
    pub(super) rejected: IntCounter,
    registry: Registry,
}

impl Metrics {
    /// Creates a new instance of the evidence pool metrics.
    pub(super) fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let pending = IntGauge::new(
            "evidence_pool_pending".to_string(),
            "number of evidence items pending inclusion in a block.".to_string(),
        )?;
        let committed = IntCounter::new(
            "evidence_pool_committed_total".to_string(),
            "number of evidence items marked as committed.".to_string(),
        )?;
        let expired = IntCounter::new(
            "evidence_pool_expired_total".to_string(),
            "number of pending evidence items pruned after expiring.".to_string(),
        )?;
        let rejected = IntCounter::new(
            "evidence_pool_rejected_total".to_string(),
            "number of evidence items rejected as invalid.".to_string(),
        )?;

        registry.register(Box::new(pending.clone()))?;
        registry.register(Box::new(committed.clone()))?;
        registry.register(Box::new(expired.clone()))?;
        registry.register(Box::new(rejected.clone()))?;

        Ok(Metrics {
            pending,
            committed,
            expired,
            rejected,
            registry: registry.clone(),
        })
    }
}

impl Drop for Metrics {
    fn drop(&mut self) {
        unregister_metric!(self.registry, self.pending);
        unregister_metric!(self.registry, self.committed);
        unregister_metric!(self.registry, self.expired);
        unregister_metric!(self.registry, self.rejected);
    }
}
