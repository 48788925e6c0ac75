//! The byte range of the medium owned by the store.

use crate::error::{CoreError, CoreResult};
use crate::layout::{HEADER_SIZE, RECORD_FIXED_SIZE, WORD_SIZE};
use std::ops::Range;

/// Byte bounds of the store inside the non-volatile medium.
///
/// The window is not persisted: every boot session that shares the same
/// records must open the store with the same offset and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Bytes to skip at the start of the medium.
    pub offset: u16,
    /// Bytes owned by the store.
    pub size: u16,
}

impl Window {
    /// Creates a window.
    #[must_use]
    pub const fn new(offset: u16, size: u16) -> Self {
        Self { offset, size }
    }

    /// First medium byte past the window.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset as usize + self.size as usize
    }

    /// The window as a range of medium bytes.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset as usize..self.end()
    }

    /// True if `len` bytes at window-relative `offset` stay inside the window.
    #[must_use]
    pub fn contains(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.size as usize)
    }

    /// Smallest window that can hold the header and one record of
    /// `min_stack_depth` words.
    #[must_use]
    pub const fn minimum_size(min_stack_depth: u16) -> usize {
        HEADER_SIZE + RECORD_FIXED_SIZE + min_stack_depth as usize * WORD_SIZE
    }

    /// Checks the window against a medium of `sector_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WindowOutOfBounds`] if the window runs past the
    /// sector, or [`CoreError::WindowTooSmall`] if no record could fit.
    pub fn validate(&self, sector_size: usize, min_stack_depth: u16) -> CoreResult<()> {
        if self.end() > sector_size {
            return Err(CoreError::WindowOutOfBounds {
                offset: self.offset,
                size: self.size,
                sector_size,
            });
        }

        let minimum = Self::minimum_size(min_stack_depth);
        if (self.size as usize) < minimum {
            return Err(CoreError::WindowTooSmall {
                size: self.size,
                minimum,
            });
        }

        Ok(())
    }
}
