use thiserror::Error;

use crate::components::evidence_pool;

/// An error handling evidence received from a peer.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload was not valid evidence.
    #[error("failed to decode evidence: {0}")]
    Decode(bincode::Error),
    /// The pool didn't accept the evidence.
    #[error(transparent)]
    Pool(#[from] evidence_pool::Error),
}

impl Error {
    /// Returns `true` if the peer that sent the payload misbehaved, as opposed to a local failure.
    pub fn should_penalize_peer(&self) -> bool {
        match self {
            Error::Decode(_) => true,
            Error::Pool(err) => err.invalid_reason().is_some(),
        }
    }
}
