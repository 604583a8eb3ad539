//! The chain state snapshot consulted for expiry and validation decisions.
//!
//! Readers get an `Arc<ChainState>` without taking a lock; a committed block replaces the whole
//! snapshot with a pointer swap.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use evidence_types::ChainState;

/// Holds the latest chain state snapshot.
#[derive(Debug)]
pub struct ChainStateCache {
    current: ArcSwap<ChainState>,
}

impl ChainStateCache {
    /// Creates a cache holding `state`.
    pub fn new(state: ChainState) -> Self {
        ChainStateCache {
            current: ArcSwap::from_pointee(state),
        }
    }

    /// Returns the current snapshot.
    pub fn load(&self) -> Arc<ChainState> {
        self.current.load_full()
    }

    /// Returns the height of the last committed block.
    pub fn height(&self) -> u64 {
        self.current.load().last_block_height
    }

    /// Replaces the snapshot, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `new_state` is not higher than the current snapshot.
    pub fn advance(&self, new_state: ChainState) -> Arc<ChainState> {
        let new_state = Arc::new(new_state);
        let previous = self.current.rcu(|current| {
            assert!(
                new_state.last_block_height > current.last_block_height,
                "chain state must advance: new height {} is not above current height {}",
                new_state.last_block_height,
                current.last_block_height
            );
            Arc::clone(&new_state)
        });
        debug!(
            from = previous.last_block_height,
            to = new_state.last_block_height,
            "advanced chain state"
        );
        previous
    }
}
