//! Components
//!
//! The building blocks of the evidence subsystem. The [`evidence_pool`] owns pending and
//! committed evidence on top of a durable [`storage`] back end, and the [`evidence_gossiper`]
//! fans its contents out to peers.

pub mod chain_state_cache;
pub mod evidence_gossiper;
pub mod evidence_pool;
pub mod storage;
