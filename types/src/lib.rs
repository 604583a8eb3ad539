//! Types shared by the components which collect, verify, store and gossip proof of validator
//! misbehavior.

#![doc(test(attr(forbid(warnings))))]
#![warn(missing_docs)]

mod chain_state;
pub mod crypto;
mod digest;
mod evidence;
#[cfg(any(feature = "testing", test))]
pub mod testing;
mod timestamp;
mod validator;
mod vote;

pub use chain_state::{BlockMeta, ChainState, Commit, EvidenceParams};
pub use crypto::{PublicKey, SecretKey, Signature};
pub use digest::Digest;
pub use evidence::{evidence_list_size, DuplicateVoteEvidence, Evidence, EvidenceError};
pub use timestamp::{TimeDiff, Timestamp};
pub use validator::{Validator, ValidatorSet};
pub use vote::{BlockHash, Vote, VoteType};
