//! The evidence pool.
//!
//! Collects proof of validator misbehavior, keeps it pending until a block includes it and prunes
//! it once it is too old to act on. Pending evidence lives in the durable store; an in-memory
//! [`GossipList`] mirrors it for fan-out to peers and can always be rebuilt from the store.
//!
//! Evidence moves through three states:
//!
//! * pending: verified (or reported by local consensus) and waiting for inclusion in a block,
//! * committed: included in a block. Only the height is recorded, the payload lives in the block,
//! * gone: expired before being committed.

mod error;
mod keys;
mod metrics;
#[cfg(test)]
mod tests;
mod verification;

use std::{
    collections::HashSet,
    fmt::{self, Debug, Formatter},
    ops::ControlFlow,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use itertools::Itertools;
use prometheus::Registry;
use tracing::{debug, error, info, warn};

use evidence_types::{ChainState, Digest, Evidence, TimeDiff, Timestamp};

use crate::{
    components::{chain_state_cache::ChainStateCache, storage::Store},
    utils::{Element, GossipList},
};
pub use error::{Error, InvalidEvidenceReason, OpenError};
use keys::PENDING_PREFIX;
use metrics::Metrics;
pub use verification::{BlockStore, StateStore, StateStoreError};

/// Encoded size of an empty evidence list, i.e. the list's length prefix.
const EVIDENCE_LIST_PREFIX_SIZE: i64 = 8;

/// Extra margin added to the expiry time of the oldest surviving evidence.
const PRUNE_TIME_MARGIN: TimeDiff = TimeDiff::from_seconds(1);

/// The earliest chain height and time at which any pending evidence could have expired.
///
/// Pruning is skipped until the chain has passed both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PruneWatermark {
    /// Height the chain has to exceed.
    pub height: u64,
    /// Time the chain has to exceed.
    pub time: Timestamp,
}

impl PruneWatermark {
    fn at(state: &ChainState) -> Self {
        PruneWatermark {
            height: state.last_block_height,
            time: state.last_block_time,
        }
    }

    fn is_passed_by(&self, state: &ChainState) -> bool {
        state.last_block_height > self.height && state.last_block_time > self.time
    }

    /// Moves the watermark forward, never backwards.
    fn raise_to(&mut self, other: PruneWatermark) {
        self.height = self.height.max(other.height);
        self.time = self.time.max(other.time);
    }
}

/// Pool of pending evidence.
pub struct EvidencePool {
    /// Durable pending and committed namespaces.
    store: Arc<dyn Store>,
    state_store: Arc<dyn StateStore>,
    block_store: Arc<dyn BlockStore>,
    chain_state: ChainStateCache,
    /// Number of keys in the pending namespace.
    pending_count: AtomicUsize,
    /// Every pending item, for gossiping.
    evidence_list: Arc<GossipList<Evidence>>,
    /// Also serializes writes to the pending and committed namespaces.
    prune_watermark: Mutex<PruneWatermark>,
    metrics: Metrics,
}

impl EvidencePool {
    /// Opens the pool over `store`.
    ///
    /// Pending evidence left in the store is loaded into the gossip list oldest first, and
    /// whatever has expired in the meantime is pruned.
    pub fn open(
        state_store: Arc<dyn StateStore>,
        store: Arc<dyn Store>,
        block_store: Arc<dyn BlockStore>,
        registry: &Registry,
    ) -> Result<Self, OpenError> {
        let state = state_store.latest_state();
        let metrics = Metrics::new(registry)?;

        let mut pending_keys = 0;
        let mut recovered = Vec::new();
        store.scan_prefix(PENDING_PREFIX, &mut |key, value| {
            pending_keys += 1;
            match Evidence::from_bytes(value) {
                Ok(evidence) => recovered.push(evidence),
                Err(err) => error!(
                    key = %String::from_utf8_lossy(key),
                    %err,
                    "failed to decode pending evidence"
                ),
            }
            ControlFlow::Continue(())
        })?;

        let pool = EvidencePool {
            store,
            state_store,
            block_store,
            chain_state: ChainStateCache::new(state.clone()),
            pending_count: AtomicUsize::new(pending_keys),
            evidence_list: Arc::new(GossipList::new()),
            prune_watermark: Mutex::new(PruneWatermark::at(&state)),
            metrics,
        };
        for evidence in recovered {
            pool.evidence_list.push_back(evidence);
        }
        {
            let mut watermark = pool.lock_watermark();
            if let Some(next) = pool.remove_expired(&state) {
                watermark.raise_to(next);
            }
        }
        pool.metrics.pending.set(pool.size() as i64);

        info!(
            pending = pool.size(),
            height = state.last_block_height,
            "opened evidence pool"
        );
        Ok(pool)
    }

    /// Adds evidence received from a peer, verifying it first.
    ///
    /// Evidence that is already pending or committed is accepted without further action, so a
    /// lagging peer isn't penalized for resending old proof.
    pub fn add_evidence(&self, evidence: Evidence) -> Result<(), Error> {
        let evidence_hash = evidence.hash();
        if self.is_pending(&evidence) {
            debug!(%evidence_hash, "evidence already pending");
            return Ok(());
        }
        if self.is_committed(&evidence) {
            debug!(%evidence_hash, "evidence already committed");
            return Ok(());
        }

        self.verify(&evidence)?;
        if self.admit(&evidence)? {
            info!(%evidence_hash, %evidence, "verified new evidence of byzantine behavior");
        }
        Ok(())
    }

    /// Adds evidence detected by the local consensus engine, skipping verification.
    pub fn add_evidence_trusted(&self, evidence: Evidence) -> Result<(), Error> {
        let evidence_hash = evidence.hash();
        if self.is_pending(&evidence) {
            debug!(%evidence_hash, "evidence already pending");
            return Ok(());
        }

        if self.admit(&evidence)? {
            info!(%evidence_hash, %evidence, "added evidence of byzantine behavior from consensus");
        }
        Ok(())
    }

    /// Checks the evidence section of a proposed block.
    ///
    /// The whole list is rejected if it contains the same evidence twice, evidence that is
    /// already committed or evidence that fails verification. Evidence that wasn't pending yet is
    /// admitted as pending once verified.
    pub fn check_evidence(&self, evidence: &[Evidence]) -> Result<(), Error> {
        let hashes: Vec<Digest> = evidence.iter().map(Evidence::hash).collect();
        if let Some((_, second)) = (0..hashes.len())
            .tuple_combinations()
            .find(|&(first, second)| hashes[first] == hashes[second])
        {
            self.metrics.rejected.inc();
            return Err(Error::invalid(
                &evidence[second],
                InvalidEvidenceReason::Duplicate,
            ));
        }

        for (item, evidence_hash) in evidence.iter().zip(&hashes) {
            // Everything pending has been verified on admission.
            if self.is_pending(item) {
                continue;
            }
            if self.is_committed(item) {
                self.metrics.rejected.inc();
                return Err(Error::invalid(
                    item,
                    InvalidEvidenceReason::AlreadyCommitted,
                ));
            }
            self.verify(item)?;

            match self.admit(item) {
                Ok(true) => {
                    info!(%evidence_hash, %item, "verified new evidence of byzantine behavior")
                }
                Ok(false) => {}
                Err(err) => error!(%evidence_hash, %err, "failed to add evidence to pending"),
            }
        }
        Ok(())
    }

    /// Returns pending evidence oldest first, as much as fits into `max_bytes` when encoded as a
    /// list, together with the encoded size of the returned list.
    ///
    /// A negative `max_bytes` means no limit.
    pub fn pending_evidence(&self, max_bytes: i64) -> (Vec<Evidence>, i64) {
        if self.size() == 0 {
            return (Vec::new(), 0);
        }

        let mut evidence = Vec::new();
        let mut list_size = EVIDENCE_LIST_PREFIX_SIZE;
        let result = self.store.scan_prefix(PENDING_PREFIX, &mut |key, value| {
            let item = match Evidence::from_bytes(value) {
                Ok(item) => item,
                Err(err) => {
                    error!(
                        key = %String::from_utf8_lossy(key),
                        %err,
                        "failed to decode pending evidence"
                    );
                    return ControlFlow::Continue(());
                }
            };
            let next_size = list_size.saturating_add(value.len() as i64);
            if max_bytes >= 0 && next_size > max_bytes {
                return ControlFlow::Break(());
            }
            list_size = next_size;
            evidence.push(item);
            ControlFlow::Continue(())
        });
        if let Err(err) = result {
            error!(%err, "unable to retrieve pending evidence");
        }

        if evidence.is_empty() {
            (evidence, 0)
        } else {
            (evidence, list_size)
        }
    }

    /// Advances the pool to a newly committed block.
    ///
    /// Evidence included in the block moves from pending to committed, then expired evidence is
    /// pruned if the chain has passed the prune watermark.
    ///
    /// # Panics
    ///
    /// Panics if `new_state` is not higher than the current chain state.
    pub fn update(&self, new_state: ChainState, committed_evidence: &[Evidence]) {
        // Must not panic while holding the watermark lock.
        let current_height = self.chain_state.height();
        assert!(
            new_state.last_block_height > current_height,
            "chain state must advance: new height {} is not above current height {}",
            new_state.last_block_height,
            current_height
        );

        let mut watermark = self.lock_watermark();
        info!(
            last_block_height = new_state.last_block_height,
            last_block_time = %new_state.last_block_time,
            "updating evidence pool"
        );

        self.chain_state.advance(new_state);
        let state = self.chain_state.load();

        self.mark_committed(committed_evidence, state.last_block_height);

        if self.size() > 0 && watermark.is_passed_by(&state) {
            if let Some(next) = self.remove_expired(&state) {
                watermark.raise_to(next);
            }
        }
    }

    /// Verifies evidence against the current chain state without adding it.
    pub fn verify(&self, evidence: &Evidence) -> Result<(), Error> {
        let state = self.chain_state.load();
        verification::verify(
            evidence,
            &state,
            self.state_store.as_ref(),
            self.block_store.as_ref(),
        )
        .map_err(|reason| {
            self.metrics.rejected.inc();
            warn!(evidence_hash = %evidence.hash(), %reason, "rejected invalid evidence");
            Error::invalid(evidence, reason)
        })
    }

    /// Returns the number of pending evidence items.
    pub fn size(&self) -> usize {
        self.pending_count.load(Ordering::SeqCst)
    }

    /// Returns the current chain state snapshot.
    pub fn state(&self) -> Arc<ChainState> {
        self.chain_state.load()
    }

    /// Returns the current prune watermark.
    pub fn prune_watermark(&self) -> PruneWatermark {
        *self.lock_watermark()
    }

    /// Returns the oldest pending evidence in the gossip list.
    pub fn front(&self) -> Option<Arc<Element<Evidence>>> {
        self.evidence_list.front()
    }

    /// Returns the gossip list mirroring the pending evidence.
    pub fn evidence_list(&self) -> Arc<GossipList<Evidence>> {
        Arc::clone(&self.evidence_list)
    }

    /// Returns `true` if the evidence is pending. Store failures are logged and count as absent.
    pub fn is_pending(&self, evidence: &Evidence) -> bool {
        self.store
            .has(&keys::pending_key(evidence))
            .unwrap_or_else(|err| {
                error!(%err, "unable to look up pending evidence");
                false
            })
    }

    /// Returns `true` if the evidence is committed. Store failures are logged and count as absent.
    pub fn is_committed(&self, evidence: &Evidence) -> bool {
        self.store
            .has(&keys::committed_key(evidence))
            .unwrap_or_else(|err| {
                error!(%err, "unable to look up committed evidence");
                false
            })
    }

    /// Returns the height of the block the evidence was committed in.
    pub fn committed_height(&self, evidence: &Evidence) -> Result<Option<u64>, Error> {
        match self.store.get(&keys::committed_key(evidence))? {
            Some(bytes) => Ok(Some(keys::decode_committed_height(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns the full committed evidence from the block that included it.
    ///
    /// Returns `None` if the evidence isn't committed or the block is no longer stored.
    pub fn recover_committed(&self, evidence: &Evidence) -> Result<Option<Evidence>, Error> {
        let height = match self.committed_height(evidence)? {
            Some(height) => height,
            None => return Ok(None),
        };
        let evidence_hash = evidence.hash();
        let commit = match self.block_store.commit_at(height) {
            Some(commit) => commit,
            None => {
                debug!(%evidence_hash, height, "block of committed evidence no longer stored");
                return Ok(None);
            }
        };
        Ok(commit
            .evidence
            .into_iter()
            .find(|item| item.hash() == evidence_hash))
    }

    fn lock_watermark(&self) -> MutexGuard<PruneWatermark> {
        self.prune_watermark.lock().expect("should lock")
    }

    /// Writes the evidence to the pending namespace and the gossip list.
    ///
    /// Returns `false` if it was already pending or has been committed meanwhile.
    fn admit(&self, evidence: &Evidence) -> Result<bool, Error> {
        let value = evidence.to_bytes()?;
        let _guard = self.lock_watermark();
        if self.is_committed(evidence) {
            return Ok(false);
        }
        if !self.store.put(&keys::pending_key(evidence), &value)? {
            return Ok(false);
        }
        self.pending_count.fetch_add(1, Ordering::SeqCst);
        self.metrics.pending.set(self.size() as i64);
        self.evidence_list.push_back(evidence.clone());
        Ok(true)
    }

    /// Moves evidence included in the block at `block_height` from pending to committed.
    fn mark_committed(&self, committed_evidence: &[Evidence], block_height: u64) {
        let removed: HashSet<Digest> = committed_evidence
            .iter()
            .filter(|evidence| self.is_pending(evidence))
            .map(Evidence::hash)
            .collect();
        // The gossip list must never hold evidence missing from the pending namespace.
        if !removed.is_empty() {
            self.evidence_list
                .remove_where(|evidence| removed.contains(&evidence.hash()));
        }

        for evidence in committed_evidence {
            let evidence_hash = evidence.hash();
            if removed.contains(&evidence_hash) {
                self.remove_pending(evidence);
            }

            // The payload stays in the block, so the marker only records where to find it.
            let marker = match keys::encode_committed_height(block_height) {
                Ok(marker) => marker,
                Err(err) => {
                    error!(%evidence_hash, %err, "failed to encode committed evidence");
                    continue;
                }
            };
            match self.store.put(&keys::committed_key(evidence), &marker) {
                Ok(true) => self.metrics.committed.inc(),
                Ok(false) => {}
                Err(err) => error!(%evidence_hash, %err, "unable to save committed evidence"),
            }
        }
    }

    /// Deletes pending evidence from the store. Returns `true` if it was pending.
    fn remove_pending(&self, evidence: &Evidence) -> bool {
        match self.store.delete(&keys::pending_key(evidence)) {
            Ok(true) => {
                self.pending_count.fetch_sub(1, Ordering::SeqCst);
                self.metrics.pending.set(self.size() as i64);
                info!(evidence_hash = %evidence.hash(), "deleted pending evidence");
                true
            }
            Ok(false) => false,
            Err(err) => {
                error!(evidence_hash = %evidence.hash(), %err, "unable to delete pending evidence");
                false
            }
        }
    }

    /// Prunes pending evidence that has expired under `state`, oldest first, stopping at the first
    /// survivor.
    ///
    /// Returns the watermark after which the oldest survivor could expire, or `None` if the store
    /// couldn't be scanned.
    fn remove_expired(&self, state: &ChainState) -> Option<PruneWatermark> {
        let mut expired = Vec::new();
        let mut oldest_survivor = None;
        let result = self.store.scan_prefix(PENDING_PREFIX, &mut |key, value| {
            let evidence = match Evidence::from_bytes(value) {
                Ok(evidence) => evidence,
                Err(err) => {
                    error!(
                        key = %String::from_utf8_lossy(key),
                        %err,
                        "failed to decode pending evidence"
                    );
                    return ControlFlow::Continue(());
                }
            };
            if state.is_expired(evidence.height(), evidence.time()) {
                expired.push(evidence);
                ControlFlow::Continue(())
            } else {
                oldest_survivor = Some((evidence.height(), evidence.time()));
                ControlFlow::Break(())
            }
        });

        if !expired.is_empty() {
            let expired_hashes: HashSet<Digest> = expired.iter().map(Evidence::hash).collect();
            self.evidence_list
                .remove_where(|evidence| expired_hashes.contains(&evidence.hash()));
            let removed = expired
                .iter()
                .filter(|evidence| self.remove_pending(evidence))
                .count();
            self.metrics.expired.inc_by(removed as u64);
            info!(removed, "pruned expired evidence");
        }

        if let Err(err) = result {
            error!(%err, "unable to scan pending evidence for expiry");
            return None;
        }

        let params = state.evidence_params;
        Some(match oldest_survivor {
            Some((height, time)) => PruneWatermark {
                height: height
                    .saturating_add(params.max_age_num_blocks)
                    .saturating_add(1),
                time: time
                    .saturating_add(params.max_age_duration)
                    .saturating_add(PRUNE_TIME_MARGIN),
            },
            // Nothing left that could expire before new evidence arrives.
            None => PruneWatermark::at(state),
        })
    }
}

impl Debug for EvidencePool {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("EvidencePool")
            .field("state", &self.chain_state.load())
            .field("pending", &self.size())
            .field("evidence_list", &self.evidence_list)
            .finish()
    }
}
