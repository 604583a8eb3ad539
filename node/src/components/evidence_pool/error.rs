use thiserror::Error;

use evidence_types::{crypto, Evidence, EvidenceError, Timestamp};

use super::verification::StateStoreError;
use crate::components::storage;

/// An error returned by the evidence pool.
#[derive(Debug, Error)]
pub enum Error {
    /// The evidence failed validation. The peer that sent it should be penalized.
    #[error("invalid evidence {evidence}: {reason}")]
    InvalidEvidence {
        /// The offending evidence.
        evidence: Box<Evidence>,
        /// Why it was rejected.
        reason: InvalidEvidenceReason,
    },
    /// The evidence store failed.
    #[error("evidence persistence failed: {0}")]
    Persistence(#[from] storage::Error),
    /// Evidence or a committed marker could not be encoded or decoded.
    #[error("evidence encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
}

impl Error {
    pub(super) fn invalid(evidence: &Evidence, reason: InvalidEvidenceReason) -> Self {
        Error::InvalidEvidence {
            evidence: Box::new(evidence.clone()),
            reason,
        }
    }

    /// Returns the rejection reason if this is an `InvalidEvidence` error.
    pub fn invalid_reason(&self) -> Option<&InvalidEvidenceReason> {
        match self {
            Error::InvalidEvidence { reason, .. } => Some(reason),
            Error::Persistence(_) | Error::Encoding(_) => None,
        }
    }
}

/// The reason evidence was rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidEvidenceReason {
    /// The evidence has already been included in a block.
    #[error("evidence was already committed")]
    AlreadyCommitted,
    /// The same evidence appears twice in one list.
    #[error("duplicate evidence")]
    Duplicate,
    /// The evidence is from a height the chain has not reached.
    #[error("evidence from height {evidence_height} is ahead of chain height {chain_height}")]
    FutureHeight {
        /// Height of the evidence.
        evidence_height: u64,
        /// Height of the last committed block.
        chain_height: u64,
    },
    /// The evidence is too old to act on.
    #[error("evidence from height {height} at {time} has expired")]
    Expired {
        /// Height of the evidence.
        height: u64,
        /// Time of the evidence.
        time: Timestamp,
    },
    /// The evidence time differs from the time of the block at its height.
    #[error("evidence time {evidence_time} differs from block time {block_time}")]
    TimeMismatch {
        /// Time recorded in the evidence.
        evidence_time: Timestamp,
        /// Time of the block at the evidence height.
        block_time: Timestamp,
    },
    /// The validator set at the evidence height could not be loaded.
    #[error("validator lookup failed: {0}")]
    ValidatorLookup(StateStoreError),
    /// The accused validator was not in the validator set at the evidence height.
    #[error("accused validator was not in the validator set")]
    UnknownValidator,
    /// The recorded power of the accused validator is wrong.
    #[error("validator power {recorded} differs from actual power {actual}")]
    ValidatorPowerMismatch {
        /// Power recorded in the evidence.
        recorded: u64,
        /// Power in the validator set.
        actual: u64,
    },
    /// The recorded total voting power is wrong.
    #[error("total voting power {recorded} differs from actual total {actual}")]
    TotalVotingPowerMismatch {
        /// Total power recorded in the evidence.
        recorded: u64,
        /// Total power of the validator set.
        actual: u64,
    },
    /// The evidence is structurally invalid.
    #[error(transparent)]
    Malformed(EvidenceError),
    /// A vote signature did not verify against the accused validator's key.
    #[error("invalid vote signature: {0}")]
    InvalidSignature(crypto::Error),
}

/// An error opening the evidence pool.
#[derive(Debug, Error)]
pub enum OpenError {
    /// Pending evidence could not be read back from the store.
    #[error("failed to load pending evidence: {0}")]
    Storage(#[from] storage::Error),
    /// Metrics could not be registered.
    #[error("failed to initialize metrics for evidence pool: {0}")]
    Prometheus(#[from] prometheus::Error),
}
