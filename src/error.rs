//! Error types
//!
//! `StorageError` covers the persistence tiers; `ApiError` is what every public
//! operation in the crate returns.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a storage tier.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("sled error: {0}")]
    Sled(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("storage tier unavailable: {0}")]
    Unavailable(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Sled(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("directory unreadable: {path}: {reason}")]
    DirectoryUnreadable { path: PathBuf, reason: String },

    #[error("file unreadable: {path}: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("concatenation failed: none of the {attempted} selected files could be read")]
    ConcatenationFailed { attempted: usize },

    #[error("storage capacity exceeded for '{key}' ({size_bytes} bytes): {reason}")]
    StorageCapacityExceeded {
        key: String,
        size_bytes: usize,
        reason: String,
    },

    #[error("path not in tree: {0}")]
    PathNotInTree(PathBuf),

    #[error("duplicate node in tree: {0}")]
    DuplicateNode(PathBuf),

    #[error("tree build for {root} was superseded by a newer build")]
    BuildCancelled { root: PathBuf },

    #[error("no value stored under '{0}'")]
    KeyNotFound(String),

    #[error("access to sensitive path refused: {0}")]
    SensitivePath(PathBuf),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl ApiError {
    /// Whether this error only affects a single item of a batch.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            ApiError::DirectoryUnreadable { .. }
                | ApiError::FileUnreadable { .. }
                | ApiError::SensitivePath(_)
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
