//! Testing utilities.
//!
//! Contains mock collaborators for the evidence pool and a fixture producing valid evidence.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use evidence_types::{
    testing::TestRng, BlockMeta, ChainState, Commit, Digest, DuplicateVoteEvidence, Evidence,
    EvidenceParams, PublicKey, SecretKey, TimeDiff, Timestamp, Validator, ValidatorSet, Vote,
    VoteType,
};
use prometheus::Registry;

use crate::{
    components::{
        evidence_pool::{BlockStore, EvidencePool, StateStore, StateStoreError},
        storage::{InMemStore, Store},
    },
    logging,
};

/// Sets up logging for testing.
///
/// Can safely be called multiple times.
pub(crate) fn init_logging() {
    logging::init()
        // Ignore the return value, setting the global subscriber will fail if `init_logging` has
        // been called before, which we don't care about.
        .ok();
}

/// Produces evidence against a fixed validator.
///
/// Owns the test's `TestRng`, so tests using a fixture must not create another one.
pub(crate) struct EvidenceFixture {
    pub(crate) rng: TestRng,
    secret_key: SecretKey,
    validators: ValidatorSet,
}

impl EvidenceFixture {
    /// Voting power of the accused validator.
    pub(crate) const ACCUSED_POWER: u64 = 10;

    pub(crate) fn new() -> Self {
        let mut rng = TestRng::new();
        let secret_key = SecretKey::random(&mut rng);
        let validators = ValidatorSet::new(vec![
            Validator::new(PublicKey::from(&secret_key), Self::ACCUSED_POWER),
            Validator::new(PublicKey::random(&mut rng), 30),
        ]);
        EvidenceFixture {
            rng,
            secret_key,
            validators,
        }
    }

    pub(crate) fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Two conflicting prevotes at `height` and `round`.
    pub(crate) fn conflicting_votes(&self, height: u64, round: u32) -> (Vote, Vote) {
        let vote = |block: &[u8]| {
            Vote::new_signed(
                VoteType::Prevote,
                height,
                round,
                Some(Digest::hash(block)),
                Timestamp::from(height * 1_000),
                &self.secret_key,
            )
        };
        (vote(b"first block"), vote(b"second block"))
    }

    /// Valid duplicate vote evidence for `height`, recorded with block time `time_millis`.
    ///
    /// Different rounds yield different evidence.
    pub(crate) fn evidence(&self, height: u64, round: u32, time_millis: u64) -> Evidence {
        let (vote1, vote2) = self.conflicting_votes(height, round);
        DuplicateVoteEvidence::new(
            vote1,
            vote2,
            Timestamp::from(time_millis),
            &self.validators,
        )
        .expect("accused validator should be in the set")
        .into()
    }
}

/// A state store serving one validator set for every height from `first_height` on.
#[derive(Debug)]
pub(crate) struct MockStateStore {
    state: Mutex<ChainState>,
    validators: ValidatorSet,
    first_height: u64,
}

impl MockStateStore {
    pub(crate) fn new(state: ChainState, validators: ValidatorSet) -> Self {
        MockStateStore {
            state: Mutex::new(state),
            validators,
            first_height: 0,
        }
    }

    /// Makes validator lookups below `first_height` fail.
    pub(crate) fn with_first_height(mut self, first_height: u64) -> Self {
        self.first_height = first_height;
        self
    }

    /// Changes the state returned to pools opened from now on.
    pub(crate) fn set_state(&self, state: ChainState) {
        *self.state.lock().expect("should lock") = state;
    }
}

impl StateStore for MockStateStore {
    fn latest_state(&self) -> ChainState {
        self.state.lock().expect("should lock").clone()
    }

    fn validators_at(&self, height: u64) -> Result<ValidatorSet, StateStoreError> {
        if height < self.first_height {
            return Err(StateStoreError::NoValidatorSet(height));
        }
        Ok(self.validators.clone())
    }
}

/// A block store backed by maps.
#[derive(Debug, Default)]
pub(crate) struct MockBlockStore {
    metas: Mutex<HashMap<u64, BlockMeta>>,
    commits: Mutex<HashMap<u64, Commit>>,
}

impl MockBlockStore {
    pub(crate) fn insert_meta(&self, block_meta: BlockMeta) {
        self.metas
            .lock()
            .expect("should lock")
            .insert(block_meta.height, block_meta);
    }

    pub(crate) fn insert_commit(&self, commit: Commit) {
        self.commits
            .lock()
            .expect("should lock")
            .insert(commit.height, commit);
    }
}

impl BlockStore for MockBlockStore {
    fn block_meta(&self, height: u64) -> Option<BlockMeta> {
        self.metas.lock().expect("should lock").get(&height).copied()
    }

    fn commit_at(&self, height: u64) -> Option<Commit> {
        self.commits.lock().expect("should lock").get(&height).cloned()
    }
}

/// Chain state at `height` and `time_millis` with the given evidence age limits.
pub(crate) fn chain_state(
    height: u64,
    time_millis: u64,
    max_age_num_blocks: u64,
    max_age_millis: u64,
) -> ChainState {
    ChainState::new(
        height,
        Timestamp::from(time_millis),
        EvidenceParams::new(max_age_num_blocks, TimeDiff::from_millis(max_age_millis)),
    )
}

/// An evidence pool wired to mocks, with handles to everything behind it.
pub(crate) struct PoolHarness {
    pub(crate) pool: Arc<EvidencePool>,
    pub(crate) state_store: Arc<MockStateStore>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) block_store: Arc<MockBlockStore>,
    pub(crate) registry: Registry,
}

impl PoolHarness {
    /// Opens a pool over an empty in-memory store.
    pub(crate) fn new(state: ChainState, validators: ValidatorSet) -> Self {
        Self::with_store(
            Arc::new(MockStateStore::new(state, validators)),
            Arc::new(InMemStore::new()),
            Arc::new(MockBlockStore::default()),
        )
    }

    pub(crate) fn with_store(
        state_store: Arc<MockStateStore>,
        store: Arc<dyn Store>,
        block_store: Arc<MockBlockStore>,
    ) -> Self {
        let registry = Registry::new();
        let pool = EvidencePool::open(
            state_store.clone(),
            Arc::clone(&store),
            block_store.clone(),
            &registry,
        )
        .expect("should open evidence pool");
        let pool = Arc::new(pool);
        PoolHarness {
            pool,
            state_store,
            store,
            block_store,
            registry,
        }
    }

    /// Closes the pool and opens a new one over the same stores.
    pub(crate) fn reopen(self) -> Self {
        let PoolHarness {
            pool,
            state_store,
            store,
            block_store,
            ..
        } = self;
        drop(pool);
        Self::with_store(state_store, store, block_store)
    }
}
