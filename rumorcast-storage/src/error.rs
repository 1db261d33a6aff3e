//! Error type definitions for the storage module.

use thiserror::Error;

/// Errors that a `Storage` backend can return.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend's underlying I/O or serialization layer failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}
