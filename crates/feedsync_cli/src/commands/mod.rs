//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod show_all;

use clap::ValueEnum;
use feedsync_store::{FileStore, StoreError};
use std::path::Path;
use thiserror::Error;

/// Output format of reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No cache file at the given path.
    #[error("no cache found at {0}")]
    NotFound(String),

    /// The cache file could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Output could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Opens an existing cache file.
///
/// Unlike [`FileStore::open`], a missing file is an error: maintenance
/// commands never create caches.
pub async fn open_existing(path: &Path) -> Result<FileStore, CommandError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(CommandError::NotFound(path.display().to_string()));
    }
    Ok(FileStore::open(path)?)
}
