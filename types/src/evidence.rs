//! Proof that a validator violated a consensus safety rule.

use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{crypto, Digest, PublicKey, Timestamp, ValidatorSet, Vote, VoteType};

/// A structural problem with a piece of evidence.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvidenceError {
    /// The two votes were cast by different validators.
    #[error("votes were cast by different validators: {0} and {1}")]
    DifferentValidators(PublicKey, PublicKey),

    /// The two votes are at different heights.
    #[error("votes are at different heights: {0} and {1}")]
    HeightMismatch(u64, u64),

    /// The two votes are in different rounds.
    #[error("votes are in different rounds: {0} and {1}")]
    RoundMismatch(u32, u32),

    /// The two votes are of different types.
    #[error("votes are of different types: {0} and {1}")]
    TypeMismatch(VoteType, VoteType),

    /// The two votes are for the same block, so they don't conflict.
    #[error("votes are for the same block")]
    SameBlock,

    /// The votes are not ordered by block hash.
    #[error("votes are not in canonical order")]
    NonCanonicalOrder,

    /// The accused validator is not part of the validator set.
    #[error("validator {0} is not in the validator set")]
    UnknownValidator(PublicKey),
}

/// Two conflicting votes signed by the same validator at the same height, round and step.
#[derive(Clone, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuplicateVoteEvidence {
    vote_a: Vote,
    vote_b: Vote,
    total_voting_power: u64,
    validator_power: u64,
    timestamp: Timestamp,
}

impl DuplicateVoteEvidence {
    /// Creates evidence from two conflicting votes.
    ///
    /// `block_time` is the time of the block at the votes' height. The votes are stored in
    /// canonical order so the same pair always produces the same evidence hash.
    pub fn new(
        vote1: Vote,
        vote2: Vote,
        block_time: Timestamp,
        validators: &ValidatorSet,
    ) -> Result<Self, EvidenceError> {
        let validator = validators
            .get(vote1.validator())
            .ok_or(EvidenceError::UnknownValidator(*vote1.validator()))?;
        let (vote_a, vote_b) = if vote1.block_hash() <= vote2.block_hash() {
            (vote1, vote2)
        } else {
            (vote2, vote1)
        };
        Ok(DuplicateVoteEvidence {
            validator_power: validator.voting_power(),
            total_voting_power: validators.total_voting_power(),
            vote_a,
            vote_b,
            timestamp: block_time,
        })
    }

    /// Assembles evidence from parts without any checks, e.g. as received from the network.
    pub fn from_parts(
        vote_a: Vote,
        vote_b: Vote,
        total_voting_power: u64,
        validator_power: u64,
        timestamp: Timestamp,
    ) -> Self {
        DuplicateVoteEvidence {
            vote_a,
            vote_b,
            total_voting_power,
            validator_power,
            timestamp,
        }
    }

    /// Checks that the two votes genuinely conflict and are in canonical order.
    ///
    /// Signatures are not checked here; see [`DuplicateVoteEvidence::verify_signatures`].
    pub fn validate_basic(&self) -> Result<(), EvidenceError> {
        let (a, b) = (&self.vote_a, &self.vote_b);
        if a.validator() != b.validator() {
            return Err(EvidenceError::DifferentValidators(
                *a.validator(),
                *b.validator(),
            ));
        }
        if a.height() != b.height() {
            return Err(EvidenceError::HeightMismatch(a.height(), b.height()));
        }
        if a.round() != b.round() {
            return Err(EvidenceError::RoundMismatch(a.round(), b.round()));
        }
        if a.vote_type() != b.vote_type() {
            return Err(EvidenceError::TypeMismatch(a.vote_type(), b.vote_type()));
        }
        if a.block_hash() == b.block_hash() {
            return Err(EvidenceError::SameBlock);
        }
        if a.block_hash() > b.block_hash() {
            return Err(EvidenceError::NonCanonicalOrder);
        }
        Ok(())
    }

    /// Checks both votes' signatures against the given key.
    pub fn verify_signatures(&self, public_key: &PublicKey) -> Result<(), crypto::Error> {
        self.vote_a.verify(public_key)?;
        self.vote_b.verify(public_key)
    }

    /// Returns the first vote.
    pub fn vote_a(&self) -> &Vote {
        &self.vote_a
    }

    /// Returns the second vote.
    pub fn vote_b(&self) -> &Vote {
        &self.vote_b
    }

    /// Returns the total voting power of the validator set at the votes' height.
    pub fn total_voting_power(&self) -> u64 {
        self.total_voting_power
    }

    /// Returns the accused validator's voting power at the votes' height.
    pub fn validator_power(&self) -> u64 {
        self.validator_power
    }
}

/// Proof of validator misbehavior.
#[derive(Clone, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evidence {
    /// A validator signed two conflicting votes.
    DuplicateVote(DuplicateVoteEvidence),
}

impl Evidence {
    /// Returns the height the misbehavior happened at.
    pub fn height(&self) -> u64 {
        match self {
            Evidence::DuplicateVote(evidence) => evidence.vote_a.height(),
        }
    }

    /// Returns the time of the block at the misbehavior's height.
    pub fn time(&self) -> Timestamp {
        match self {
            Evidence::DuplicateVote(evidence) => evidence.timestamp,
        }
    }

    /// Returns the validator accused of misbehaving.
    pub fn accused(&self) -> &PublicKey {
        match self {
            Evidence::DuplicateVote(evidence) => evidence.vote_a.validator(),
        }
    }

    /// Returns the evidence's identity: the hash of its wire encoding.
    pub fn hash(&self) -> Digest {
        Digest::hash(self.encode())
    }

    /// Returns the wire encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decodes evidence from its wire encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Returns the length of the wire encoding.
    pub fn serialized_size(&self) -> u64 {
        bincode::serialized_size(self).unwrap_or_default()
    }

    fn encode(&self) -> Vec<u8> {
        // Every field has a fixed bincode layout, so encoding into a `Vec` cannot fail.
        self.to_bytes().unwrap_or_default()
    }
}

impl Display for Evidence {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            Evidence::DuplicateVote(evidence) => write!(
                formatter,
                "duplicate vote evidence against {} at height {}",
                evidence.vote_a.validator(),
                evidence.vote_a.height()
            ),
        }
    }
}

impl From<DuplicateVoteEvidence> for Evidence {
    fn from(evidence: DuplicateVoteEvidence) -> Self {
        Evidence::DuplicateVote(evidence)
    }
}

/// Returns the encoded size of a list of evidence: a length prefix plus every item.
pub fn evidence_list_size(evidence: &[Evidence]) -> u64 {
    bincode::serialized_size(evidence).unwrap_or_default()
}
