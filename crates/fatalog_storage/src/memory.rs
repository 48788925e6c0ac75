//! In-memory EEPROM emulation for testing.

use crate::backend::{NvStorage, ERASED_BYTE};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The durable side of an [`EmulatedEeprom`]: one erased sector.
///
/// `EepromMedia` is cheap to clone and clones share the same bytes, so a
/// test can drop a device and attach a fresh one to the same media to
/// simulate a reboot.
#[derive(Debug, Clone)]
pub struct EepromMedia {
    inner: Arc<MediaInner>,
}

#[derive(Debug)]
struct MediaInner {
    bytes: RwLock<Vec<u8>>,
    commits: AtomicUsize,
}

impl EepromMedia {
    /// Creates a fully erased sector.
    #[must_use]
    pub fn erased(sector_size: usize) -> Self {
        Self::with_data(vec![ERASED_BYTE; sector_size])
    }

    /// Creates media with pre-existing contents.
    ///
    /// The sector size is the length of `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(MediaInner {
                bytes: RwLock::new(data),
                commits: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns the sector size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.bytes.read().len()
    }

    /// Returns true if the sector has zero size.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the durable bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.inner.bytes.read().clone()
    }

    /// Overwrites durable bytes at `offset`, bypassing any mirror.
    ///
    /// Used to plant corrupted or foreign contents in tests.
    ///
    /// # Panics
    ///
    /// Panics if the range is outside the sector.
    pub fn poke(&self, offset: usize, data: &[u8]) {
        self.inner.bytes.write()[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Number of commits that reached this media.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }
}

/// An emulated EEPROM device.
///
/// Mirrors the model used by flash-emulated EEPROM on small MCUs: the
/// mirror is allocated by [`map`](NvStorage::map) at startup, and
/// [`commit`](NvStorage::commit) copies it back into the sector.
///
/// # Example
///
/// ```rust
/// use fatalog_storage::{EmulatedEeprom, NvStorage};
///
/// let mut eeprom = EmulatedEeprom::new(512);
/// eeprom.map(16).unwrap();
/// eeprom.write(4, &[1, 2, 3]).unwrap();
/// assert_eq!(eeprom.media()[4], 0xFF); // not committed yet
/// eeprom.commit().unwrap();
/// assert_eq!(&eeprom.media()[4..7], &[1, 2, 3]);
/// ```
#[derive(Debug)]
pub struct EmulatedEeprom {
    media: EepromMedia,
    mirror: Option<Vec<u8>>,
}

impl EmulatedEeprom {
    /// Creates a device over a freshly erased sector.
    #[must_use]
    pub fn new(sector_size: usize) -> Self {
        Self::on_media(EepromMedia::erased(sector_size))
    }

    /// Attaches a device to existing media.
    #[must_use]
    pub fn on_media(media: EepromMedia) -> Self {
        Self {
            media,
            mirror: None,
        }
    }

    /// Returns a handle to the durable media.
    #[must_use]
    pub fn media_handle(&self) -> EepromMedia {
        self.media.clone()
    }

    /// Returns a copy of the durable bytes (not the mirror).
    #[must_use]
    pub fn media(&self) -> Vec<u8> {
        self.media.data()
    }
}

impl NvStorage for EmulatedEeprom {
    fn sector_size(&self) -> usize {
        self.media.len()
    }

    fn map(&mut self, len: usize) -> StorageResult<()> {
        let bytes = self.media.inner.bytes.read();
        if len > bytes.len() {
            return Err(StorageError::MirrorTooLarge {
                len,
                sector_size: bytes.len(),
            });
        }
        self.mirror = Some(bytes[..len].to_vec());
        Ok(())
    }

    fn mirror(&self) -> StorageResult<&[u8]> {
        self.mirror.as_deref().ok_or(StorageError::NotMapped)
    }

    fn mirror_mut(&mut self) -> StorageResult<&mut [u8]> {
        self.mirror.as_deref_mut().ok_or(StorageError::NotMapped)
    }

    fn commit(&mut self) -> StorageResult<()> {
        let mirror = self.mirror.as_deref().ok_or(StorageError::NotMapped)?;
        self.media.inner.bytes.write()[..mirror.len()].copy_from_slice(mirror);
        self.media.inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
