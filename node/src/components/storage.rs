//! Durable storage for evidence.
//!
//! Evidence is kept in an ordered byte-keyed store. Keys sort lexically, so callers choose key
//! layouts where a prefix scan yields records in the order they need.

mod config;
mod error;
mod in_mem_store;
mod lmdb_store;

use std::{fmt::Debug, ops::ControlFlow};

pub use config::Config;
pub use error::Error;
pub use in_mem_store::InMemStore;
pub use lmdb_store::LmdbStore;

/// Result type of store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An ordered key-value store.
pub trait Store: Debug + Send + Sync {
    /// Writes `value` under `key` unless the key is already present.
    ///
    /// Returns `true` if the value was written.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<bool>;

    /// Returns the value stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Returns `true` if `key` is present.
    fn has(&self, key: &[u8]) -> Result<bool>;

    /// Removes `key`.
    ///
    /// Returns `true` if the key was present.
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Calls `visitor` on every entry whose key starts with `prefix`, in ascending key order,
    /// until it returns `ControlFlow::Break`.
    ///
    /// The visitor must not call back into the store.
    fn scan_prefix(
        &self,
        prefix: &[u8],
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<()>;
}
