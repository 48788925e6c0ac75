//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The RAM mirror has not been mapped yet.
    #[error("medium is not mapped")]
    NotMapped,

    /// The requested mirror does not fit in one sector.
    #[error("mirror of {len} bytes exceeds sector size {sector_size}")]
    MirrorTooLarge {
        /// The requested mirror length.
        len: usize,
        /// The sector size of the medium.
        sector_size: usize,
    },

    /// A write would extend beyond the mapped mirror.
    #[error("write out of range: offset {offset}, len {len}, mirror size {size}")]
    OutOfRange {
        /// The requested write offset.
        offset: usize,
        /// The requested write length.
        len: usize,
        /// The current mirror size.
        size: usize,
    },

    /// The medium refused to persist the mirror.
    #[error("commit failed: {0}")]
    CommitFailed(String),
}
