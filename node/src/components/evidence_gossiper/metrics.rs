use prometheus::{IntCounter, IntGauge, Registry};

use crate::unregister_metric;

/// Metrics for the evidence gossiper.
#[derive(Debug)]
pub(super) struct Metrics {
    /// Number of evidence items successfully sent to peers.
    pub(super) items_sent: IntCounter,
    /// Number of failed sends, retries included.
    pub(super) send_failures: IntCounter,
    /// Number of peers evidence is currently broadcast to.
    pub(super) peers: IntGauge,
    registry: Registry,
}

impl Metrics {
    pub(super) fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let items_sent = IntCounter::new(
            "evidence_gossiper_items_sent_total".to_string(),
            "number of evidence items sent to peers.".to_string(),
        )?;
        let send_failures = IntCounter::new(
            "evidence_gossiper_send_failures_total".to_string(),
            "number of failed attempts to send evidence to a peer.".to_string(),
        )?;
        let peers = IntGauge::new(
            "evidence_gossiper_peers".to_string(),
            "number of peers evidence is broadcast to.".to_string(),
        )?;

        registry.register(Box::new(items_sent.clone()))?;
        registry.register(Box::new(send_failures.clone()))?;
        registry.register(Box::new(peers.clone()))?;

        Ok(Metrics {
            items_sent,
            send_failures,
            peers,
            registry: registry.clone(),
        })
    }
}

impl Drop for Metrics {
    fn drop(&mut self) {
        unregister_metric!(self.registry, self.items_sent);
        unregister_metric!(self.registry, self.send_failures);
        unregister_metric!(self.registry, self.peers);
    }
}
