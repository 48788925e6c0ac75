//! Non-volatile medium trait definition.

use crate::error::{StorageError, StorageResult};

/// Byte value of an erased (never written) medium cell.
pub const ERASED_BYTE: u8 = 0xFF;

/// A byte-addressable non-volatile medium with a RAM mirror.
///
/// The medium is one sector of [`sector_size`](NvStorage::sector_size)
/// bytes. Callers [`map`](NvStorage::map) a prefix of it into RAM once,
/// mutate the mirror in place, and [`commit`](NvStorage::commit) it back.
///
/// # Invariants
///
/// - `map(len)` fails if `len > sector_size()`
/// - after `map(len)`, `mirror()` is exactly `len` bytes, loaded from media
/// - bytes never written read as [`ERASED_BYTE`]
/// - `commit` makes the whole mirror durable, synchronously
///
/// Mirror access and `write` never allocate; only `map` may.
///
/// # Implementors
///
/// - [`super::EmulatedEeprom`] - In-memory sector
/// - [`super::FileEeprom`] - File-backed sector image
pub trait NvStorage: Send {
    /// Returns the size of the medium's sector in bytes.
    fn sector_size(&self) -> usize;

    /// Loads the first `len` bytes of the medium into a RAM mirror.
    ///
    /// Mapping again discards the previous mirror and reloads from media.
    ///
    /// # Errors
    ///
    /// Returns an error if `len` exceeds the sector size or the medium
    /// cannot be read.
    fn map(&mut self, len: usize) -> StorageResult<()>;

    /// Returns the RAM mirror.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotMapped`] before a successful `map`.
    fn mirror(&self) -> StorageResult<&[u8]>;

    /// Returns the RAM mirror for modification.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotMapped`] before a successful `map`.
    fn mirror_mut(&mut self) -> StorageResult<&mut [u8]>;

    /// Copies `data` into the mirror at `offset`.
    ///
    /// Nothing reaches the medium until [`commit`](NvStorage::commit).
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror is not mapped or the range does not
    /// fit inside it.
    fn write(&mut self, offset: usize, data: &[u8]) -> StorageResult<()> {
        let mirror = self.mirror_mut()?;
        let size = mirror.len();
        let end = offset.checked_add(data.len()).filter(|&end| end <= size);
        let Some(end) = end else {
            return Err(StorageError::OutOfRange {
                offset,
                len: data.len(),
                size,
            });
        };
        mirror[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Writes the mirror back to the medium.
    ///
    /// After this returns successfully the mirror contents survive a reset.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is mapped or the medium write fails.
    fn commit(&mut self) -> StorageResult<()>;
}

impl<T: NvStorage + ?Sized> NvStorage for Box<T> {
    fn sector_size(&self) -> usize {
        (**self).sector_size()
    }

    fn map(&mut self, len: usize) -> StorageResult<()> {
        (**self).map(len)
    }

    fn mirror(&self) -> StorageResult<&[u8]> {
        (**self).mirror()
    }

    fn mirror_mut(&mut self) -> StorageResult<&mut [u8]> {
        (**self).mirror_mut()
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> StorageResult<()> {
        (**self).write(offset, data)
    }

    fn commit(&mut self) -> StorageResult<()> {
        (**self).commit()
    }
}
