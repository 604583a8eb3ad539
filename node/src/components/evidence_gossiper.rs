//! Broadcasts pending evidence to connected peers.
//!
//! Every peer gets its own task walking the pool's gossip list oldest first. The task follows
//! the list as evidence is appended, keeps retrying an item the peer failed to take, and starts
//! over from the front whenever no new evidence arrived for a broadcast interval, so peers that
//! missed something eventually catch up.

mod config;
mod error;
mod metrics;

use std::{
    collections::HashMap,
    fmt::{self, Debug, Display, Formatter},
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use futures::future;
use prometheus::Registry;
use tokio::{task::JoinHandle, time};
use tracing::{debug, error, info, warn};

use evidence_types::Evidence;

use crate::{
    components::evidence_pool::EvidencePool,
    utils::{Advance, Element, Fuse, GossipList, ObservableFuse, ObservableFuseDropSwitch},
};
pub use config::Config;
pub use error::Error;
use metrics::Metrics;

/// A connection to a peer evidence can be sent over.
#[async_trait]
pub trait EvidencePeer: Send + Sync + 'static {
    /// Identifier of the peer.
    type Id: Clone + Debug + Display + Eq + Hash + Send + Sync + 'static;

    /// Returns the peer's identifier.
    fn id(&self) -> Self::Id;

    /// Sends an encoded evidence item, returning `false` if the peer didn't take it.
    async fn send(&self, payload: Vec<u8>) -> bool;
}

/// The broadcast task of a single peer.
struct PeerTask {
    /// Stops the task when dropped.
    _stop: ObservableFuseDropSwitch,
    handle: JoinHandle<()>,
}

/// Broadcasts the pool's pending evidence to every added peer.
pub struct EvidenceGossiper<P: EvidencePeer> {
    pool: Arc<EvidencePool>,
    config: Config,
    peers: Mutex<HashMap<P::Id, PeerTask>>,
    shut_down: ObservableFuse,
    metrics: Arc<Metrics>,
}

impl<P: EvidencePeer> EvidenceGossiper<P> {
    /// Creates a gossiper broadcasting the evidence pending in `pool`.
    pub fn new(
        pool: Arc<EvidencePool>,
        config: Config,
        registry: &Registry,
    ) -> Result<Self, prometheus::Error> {
        Ok(EvidenceGossiper {
            pool,
            config,
            peers: Mutex::new(HashMap::new()),
            shut_down: ObservableFuse::new(),
            metrics: Arc::new(Metrics::new(registry)?),
        })
    }

    /// Starts broadcasting to `peer`, replacing any earlier connection with the same id.
    ///
    /// Must be called from within a tokio runtime. Returns `false` if the gossiper has been shut
    /// down.
    pub fn add_peer(&self, peer: P) -> bool {
        // Checked under the lock, as `shutdown` sets the fuse before draining the peers.
        let mut peers = self.lock_peers();
        if self.shut_down.is_set() {
            return false;
        }
        let peer_id = peer.id();
        let stop = ObservableFuse::new();
        let handle = tokio::spawn(broadcast(
            Arc::new(peer),
            self.pool.evidence_list(),
            self.config,
            Arc::clone(&self.metrics),
            stop.clone(),
        ));
        let task = PeerTask {
            _stop: stop.drop_switch(),
            handle,
        };

        if peers.insert(peer_id.clone(), task).is_some() {
            debug!(%peer_id, "replaced evidence broadcast to peer");
        } else {
            info!(%peer_id, "started evidence broadcast to peer");
        }
        self.metrics.peers.set(peers.len() as i64);
        true
    }

    /// Stops broadcasting to the peer. Returns `false` if it wasn't added.
    pub fn remove_peer(&self, peer_id: &P::Id) -> bool {
        let mut peers = self.lock_peers();
        let removed = peers.remove(peer_id).is_some();
        self.metrics.peers.set(peers.len() as i64);
        if removed {
            info!(%peer_id, "stopped evidence broadcast to peer");
        }
        removed
    }

    /// Returns the number of peers evidence is broadcast to.
    pub fn peer_count(&self) -> usize {
        self.lock_peers().len()
    }

    /// Handles evidence received from a peer.
    ///
    /// If the returned error [should penalize](Error::should_penalize_peer) the peer, the caller
    /// is expected to disconnect it.
    pub fn handle_incoming(&self, payload: &[u8]) -> Result<(), Error> {
        let evidence = Evidence::from_bytes(payload).map_err(Error::Decode)?;
        self.pool.add_evidence(evidence)?;
        Ok(())
    }

    /// Stops every broadcast task and waits for them to exit. Later peers are refused.
    pub async fn shutdown(&self) {
        self.shut_down.set();
        let tasks: Vec<PeerTask> = {
            let mut peers = self.lock_peers();
            self.metrics.peers.set(0);
            peers.drain().map(|(_, task)| task).collect()
        };
        let handles: Vec<JoinHandle<()>> = tasks.into_iter().map(|task| task.handle).collect();
        for result in future::join_all(handles).await {
            if let Err(err) = result {
                error!(%err, "evidence broadcast task failed");
            }
        }
        info!("evidence gossiper shut down");
    }

    fn lock_peers(&self) -> MutexGuard<HashMap<P::Id, PeerTask>> {
        self.peers.lock().expect("should lock")
    }
}

impl<P: EvidencePeer> Debug for EvidenceGossiper<P> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("EvidenceGossiper")
            .field("config", &self.config)
            .field("peers", &self.peer_count())
            .field("shut_down", &self.shut_down.is_set())
            .finish()
    }
}

/// Walks the gossip list for one peer until `stop` is set.
async fn broadcast<P: EvidencePeer>(
    peer: Arc<P>,
    evidence_list: Arc<GossipList<Evidence>>,
    config: Config,
    metrics: Arc<Metrics>,
    stop: ObservableFuse,
) {
    let peer_id = peer.id();
    'from_front: loop {
        let mut current = match evidence_list.wait_front(&stop).await {
            Some(front) => front,
            None => break,
        };

        loop {
            if !send_until_taken(peer.as_ref(), &current, &config, &metrics, &stop).await {
                break 'from_front;
            }

            tokio::select! {
                advance = current.wait_next(&stop) => match advance {
                    Advance::Next(next) => current = next,
                    Advance::Detached => continue 'from_front,
                    Advance::Cancelled => break 'from_front,
                },
                _ = time::sleep(Duration::from(config.broadcast_interval())) => {
                    debug!(%peer_id, "rebroadcasting pending evidence");
                    continue 'from_front;
                }
            }
        }
    }
    debug!(%peer_id, "evidence broadcast task exiting");
}

/// Sends the element's evidence until the peer takes it or the element is removed from the list.
///
/// Returns `false` if `stop` was set in the meantime.
async fn send_until_taken<P: EvidencePeer>(
    peer: &P,
    element: &Element<Evidence>,
    config: &Config,
    metrics: &Metrics,
    stop: &ObservableFuse,
) -> bool {
    let evidence = element.value();
    let payload = match evidence.to_bytes() {
        Ok(payload) => payload,
        Err(err) => {
            error!(evidence_hash = %evidence.hash(), %err, "failed to encode evidence");
            return true;
        }
    };

    let mut retry_interval = config.retry_interval();
    loop {
        let sent = tokio::select! {
            sent = peer.send(payload.clone()) => sent,
            _ = stop.wait() => return false,
        };
        if sent {
            metrics.items_sent.inc();
            return true;
        }

        metrics.send_failures.inc();
        warn!(
            peer_id = %peer.id(),
            evidence_hash = %evidence.hash(),
            %retry_interval,
            "failed to send evidence to peer"
        );
        tokio::select! {
            _ = time::sleep(Duration::from(retry_interval)) => {}
            _ = stop.wait() => return false,
        }
        if element.is_removed() {
            return true;
        }
        retry_interval = config.next_retry_interval(retry_interval);
    }
}
