//! Checks a piece of evidence against the chain it claims to be about.

use std::fmt::Debug;

use thiserror::Error;

use evidence_types::{
    BlockMeta, ChainState, Commit, DuplicateVoteEvidence, Evidence, ValidatorSet,
};

use super::InvalidEvidenceReason;

/// Source of chain state and historical validator sets.
pub trait StateStore: Debug + Send + Sync {
    /// Returns the state as of the last committed block.
    fn latest_state(&self) -> ChainState;

    /// Returns the validator set that was active at `height`.
    fn validators_at(&self, height: u64) -> Result<ValidatorSet, StateStoreError>;
}

/// Source of historical block data.
pub trait BlockStore: Debug + Send + Sync {
    /// Returns the header data of the block at `height`, if still stored.
    fn block_meta(&self, height: u64) -> Option<BlockMeta>;

    /// Returns the commit of the block at `height`, if still stored.
    fn commit_at(&self, height: u64) -> Option<Commit>;
}

/// A failure to resolve a validator set.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StateStoreError {
    /// No validator set is stored for the height.
    #[error("no validator set stored for height {0}")]
    NoValidatorSet(u64),
    /// The backing store failed.
    #[error("state store failure: {0}")]
    Backend(String),
}

/// Verifies `evidence` against `state`, the validator set at its height and the block there.
pub(super) fn verify(
    evidence: &Evidence,
    state: &ChainState,
    state_store: &dyn StateStore,
    block_store: &dyn BlockStore,
) -> Result<(), InvalidEvidenceReason> {
    let height = evidence.height();
    if height > state.last_block_height {
        return Err(InvalidEvidenceReason::FutureHeight {
            evidence_height: height,
            chain_height: state.last_block_height,
        });
    }
    if state.is_expired(height, evidence.time()) {
        return Err(InvalidEvidenceReason::Expired {
            height,
            time: evidence.time(),
        });
    }
    // Pruned blocks can't be checked against; the vote signatures still tie the evidence to the
    // accused validator.
    if let Some(block_meta) = block_store.block_meta(height) {
        if block_meta.time != evidence.time() {
            return Err(InvalidEvidenceReason::TimeMismatch {
                evidence_time: evidence.time(),
                block_time: block_meta.time,
            });
        }
    }

    let validators = state_store
        .validators_at(height)
        .map_err(InvalidEvidenceReason::ValidatorLookup)?;

    match evidence {
        Evidence::DuplicateVote(duplicate_vote) => {
            verify_duplicate_vote(duplicate_vote, &validators)
        }
    }
}

fn verify_duplicate_vote(
    evidence: &DuplicateVoteEvidence,
    validators: &ValidatorSet,
) -> Result<(), InvalidEvidenceReason> {
    let validator = validators
        .get(evidence.vote_a().validator())
        .ok_or(InvalidEvidenceReason::UnknownValidator)?;

    if validator.voting_power() != evidence.validator_power() {
        return Err(InvalidEvidenceReason::ValidatorPowerMismatch {
            recorded: evidence.validator_power(),
            actual: validator.voting_power(),
        });
    }
    let total_voting_power = validators.total_voting_power();
    if total_voting_power != evidence.total_voting_power() {
        return Err(InvalidEvidenceReason::TotalVotingPowerMismatch {
            recorded: evidence.total_voting_power(),
            actual: total_voting_power,
        });
    }

    evidence
        .validate_basic()
        .map_err(InvalidEvidenceReason::Malformed)?;
    evidence
        .verify_signatures(validator.public_key())
        .map_err(InvalidEvidenceReason::InvalidSignature)
}
