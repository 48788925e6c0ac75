//! File-backed sector image for host tooling.

use crate::backend::{NvStorage, ERASED_BYTE};
use crate::error::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A sector image stored in a file.
///
/// This lets host tools read and maintain a crash store that was dumped
/// from a device, or drive a simulated device across process restarts.
/// Bytes past the end of a short (or new) file read as erased.
///
/// # Durability
///
/// `commit()` writes the mirror at offset 0 and calls `File::sync_all()`.
///
/// # Example
///
/// ```no_run
/// use fatalog_storage::{FileEeprom, NvStorage};
/// use std::path::Path;
///
/// let mut eeprom = FileEeprom::open(Path::new("eeprom.bin"), 4096).unwrap();
/// eeprom.map(512).unwrap();
/// eeprom.write(0, &[0, 0xFF, 4, 0]).unwrap();
/// eeprom.commit().unwrap();
/// ```
#[derive(Debug)]
pub struct FileEeprom {
    path: PathBuf,
    file: File,
    sector_size: usize,
    mirror: Option<Vec<u8>>,
}

impl FileEeprom {
    /// Opens or creates a sector image at the given path.
    ///
    /// The file is not resized; missing bytes are treated as erased.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path, sector_size: usize) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sector_size,
            mirror: None,
        })
    }

    /// Opens or creates a sector image, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or file cannot be opened.
    pub fn open_with_create_dirs(path: &Path, sector_size: usize) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path, sector_size)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NvStorage for FileEeprom {
    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn map(&mut self, len: usize) -> StorageResult<()> {
        if len > self.sector_size {
            return Err(StorageError::MirrorTooLarge {
                len,
                sector_size: self.sector_size,
            });
        }

        let file_len = usize::try_from(self.file.metadata()?.len()).unwrap_or(usize::MAX);
        let mut buffer = vec![ERASED_BYTE; len];
        let present = len.min(file_len);
        if present > 0 {
            self.file.seek(SeekFrom::Start(0))?;
            self.file.read_exact(&mut buffer[..present])?;
        }

        self.mirror = Some(buffer);
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
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(mirror)?;
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn new_file_maps_as_erased() {
        let dir = tempdir().unwrap();
        let mut eeprom = FileEeprom::open(&dir.path().join("image.bin"), 256).unwrap();
        eeprom.map(32).unwrap();
        assert!(eeprom.mirror().unwrap().iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn commit_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("image.bin");

        {
            let mut eeprom = FileEeprom::open(&path, 256).unwrap();
            eeprom.map(16).unwrap();
            eeprom.write(8, b"crash").unwrap();
            eeprom.commit().unwrap();
        }

        let mut eeprom = FileEeprom::open(&path, 256).unwrap();
        eeprom.map(16).unwrap();
        assert_eq!(&eeprom.mirror().unwrap()[8..13], b"crash");
        assert_eq!(eeprom.mirror().unwrap()[0], ERASED_BYTE);
    }

    #[test]
    fn short_file_is_padded_with_erased_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let mut eeprom = FileEeprom::open(&path, 64).unwrap();
        eeprom.map(6).unwrap();
        assert_eq!(eeprom.mirror().unwrap(), &[1, 2, 3, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn map_larger_than_sector_fails() {
        let dir = tempdir().unwrap();
        let mut eeprom = FileEeprom::open(&dir.path().join("image.bin"), 64).unwrap();
        assert!(matches!(
            eeprom.map(128),
            Err(StorageError::MirrorTooLarge { .. })
        ));
    }

    #[test]
    fn commit_without_map_fails() {
        let dir = tempdir().unwrap();
        let mut eeprom = FileEeprom::open(&dir.path().join("image.bin"), 64).unwrap();
        assert!(matches!(eeprom.commit(), Err(StorageError::NotMapped)));
    }

    #[test]
    fn open_with_create_dirs_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dump").join("image.bin");
        let eeprom = FileEeprom::open_with_create_dirs(&path, 64).unwrap();
        assert_eq!(eeprom.path(), path.as_path());
        assert!(path.exists());
    }
}
