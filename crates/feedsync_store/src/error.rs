//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Records could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The snapshot file is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}
