use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{self, PublicKey, SecretKey, Signature},
    Digest, Timestamp,
};

/// The hash identifying a block.
pub type BlockHash = Digest;

/// The consensus step a vote was cast in.
#[derive(Clone, Copy, DataSize, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteType {
    /// First voting step of a round.
    Prevote,
    /// Second voting step of a round.
    Precommit,
}

impl Display for VoteType {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            VoteType::Prevote => write!(formatter, "prevote"),
            VoteType::Precommit => write!(formatter, "precommit"),
        }
    }
}

/// The part of a vote covered by its signature.
#[derive(Serialize)]
struct SignableVote<'a> {
    vote_type: VoteType,
    height: u64,
    round: u32,
    block_hash: &'a Option<BlockHash>,
    timestamp: Timestamp,
    validator: &'a PublicKey,
}

/// A signed consensus vote.
///
/// A `block_hash` of `None` is a vote for nil.
#[derive(Clone, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    vote_type: VoteType,
    height: u64,
    round: u32,
    block_hash: Option<BlockHash>,
    timestamp: Timestamp,
    validator: PublicKey,
    signature: Signature,
}

impl Vote {
    /// Creates a vote and signs it with `secret_key`.
    ///
    /// The validator is the public key belonging to `secret_key`.
    pub fn new_signed(
        vote_type: VoteType,
        height: u64,
        round: u32,
        block_hash: Option<BlockHash>,
        timestamp: Timestamp,
        secret_key: &SecretKey,
    ) -> Self {
        let validator = PublicKey::from(secret_key);
        let signable = SignableVote {
            vote_type,
            height,
            round,
            block_hash: &block_hash,
            timestamp,
            validator: &validator,
        };
        let signature = crypto::sign(signable_bytes(&signable), secret_key);
        Vote {
            vote_type,
            height,
            round,
            block_hash,
            timestamp,
            validator,
            signature,
        }
    }

    /// Assembles a vote from parts, e.g. as received from the network.
    pub fn from_parts(
        vote_type: VoteType,
        height: u64,
        round: u32,
        block_hash: Option<BlockHash>,
        timestamp: Timestamp,
        validator: PublicKey,
        signature: Signature,
    ) -> Self {
        Vote {
            vote_type,
            height,
            round,
            block_hash,
            timestamp,
            validator,
            signature,
        }
    }

    /// Returns the canonical bytes the signature covers.
    pub fn signable_bytes(&self) -> Vec<u8> {
        signable_bytes(&SignableVote {
            vote_type: self.vote_type,
            height: self.height,
            round: self.round,
            block_hash: &self.block_hash,
            timestamp: self.timestamp,
            validator: &self.validator,
        })
    }

    /// Checks the vote's signature against `public_key`.
    pub fn verify(&self, public_key: &PublicKey) -> Result<(), crypto::Error> {
        crypto::verify(self.signable_bytes(), &self.signature, public_key)
    }

    /// Returns the consensus step the vote was cast in.
    pub fn vote_type(&self) -> VoteType {
        self.vote_type
    }

    /// Returns the height the vote was cast at.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Returns the round the vote was cast in.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Returns the hash of the block voted for, or `None` for a nil vote.
    pub fn block_hash(&self) -> Option<&BlockHash> {
        self.block_hash.as_ref()
    }

    /// Returns the time the validator claims to have cast the vote.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns the key of the validator who cast the vote.
    pub fn validator(&self) -> &PublicKey {
        &self.validator
    }

    /// Returns the vote's signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl Display for Vote {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "{} by {} at {}/{} for ",
            self.vote_type, self.validator, self.height, self.round
        )?;
        match &self.block_hash {
            Some(block_hash) => write!(formatter, "{}", block_hash),
            None => write!(formatter, "nil"),
        }
    }
}

fn signable_bytes(signable: &SignableVote) -> Vec<u8> {
    // Serializing plain integers, options and byte arrays into a `Vec` cannot fail.
    bincode::serialize(signable).unwrap_or_default()
}
