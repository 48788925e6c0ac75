//! Error types for fatalog core.

use fatalog_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by foreground store operations.
///
/// The fault path never returns these; see
/// [`RecordOutcome`](crate::RecordOutcome).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The window does not fit inside the medium's sector.
    #[error("window {offset}+{size} does not fit sector of {sector_size} bytes")]
    WindowOutOfBounds {
        /// Requested window offset.
        offset: u16,
        /// Requested window size.
        size: u16,
        /// Sector size of the medium.
        sector_size: usize,
    },

    /// The window cannot hold even one minimal record.
    #[error("window of {size} bytes is too small, need at least {minimum}")]
    WindowTooSmall {
        /// Requested window size.
        size: u16,
        /// Smallest usable window size.
        minimum: usize,
    },

    /// The medium could not provide a writable RAM mirror.
    #[error("medium cannot provide a mirror: {source}")]
    MirrorUnavailable {
        /// The underlying storage failure.
        source: StorageError,
    },
}

impl CoreError {
    /// Creates a mirror unavailable error.
    pub fn mirror_unavailable(source: StorageError) -> Self {
        Self::MirrorUnavailable { source }
    }

    /// Returns true for errors caused by the caller's window choice.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::WindowOutOfBounds { .. } | Self::WindowTooSmall { .. }
        )
    }
}
