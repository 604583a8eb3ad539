//! # Byzantine evidence subsystem
//!
//! Collects, verifies, stores, prunes and gossips proof that a validator misbehaved, such as
//! signing two conflicting votes at the same height and round.
//!
//! ## Application structure
//!
//! The [`EvidencePool`](components::evidence_pool::EvidencePool) is the entry point: consensus
//! reports evidence it detected, peers hand in evidence they received, block proposal asks for
//! pending evidence and every committed block advances the pool. The
//! [`EvidenceGossiper`](components::evidence_gossiper::EvidenceGossiper) keeps peers up to date
//! with the pending set.

#![doc(test(attr(forbid(warnings))))]
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]

pub mod components;
pub mod config;
pub mod logging;
#[cfg(test)]
pub(crate) mod testing;
pub mod utils;

pub use components::{
    chain_state_cache::ChainStateCache,
    evidence_gossiper::{
        Config as GossipConfig, Error as GossipError, EvidenceGossiper, EvidencePeer,
    },
    evidence_pool::{
        BlockStore, Error as EvidencePoolError, EvidencePool, InvalidEvidenceReason, OpenError,
        PruneWatermark, StateStore, StateStoreError,
    },
    storage::{Config as StorageConfig, Error as StorageError, InMemStore, LmdbStore, Store},
};
pub use config::{Config, ConfigError};
pub use logging::{LoggingConfig, LoggingFormat};
