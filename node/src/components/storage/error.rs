use std::{io, path::PathBuf};

use thiserror::Error;

/// A storage error.
///
/// Errors of this kind indicate that the database is unavailable or corrupted.
#[derive(Debug, Error)]
pub enum Error {
    /// Failure to create the root database directory.
    #[error("failed to create database directory `{}`: {}", .0.display(), .1)]
    CreateDatabaseDirectory(PathBuf, io::Error),
    /// LMDB error while operating.
    #[error("internal database error: {0}")]
    Lmdb(#[from] lmdb::Error),
}
