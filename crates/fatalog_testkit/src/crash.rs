//! Media that fail on demand.
//!
//! Used to check that the fault path degrades to a status instead of
//! panicking, and that foreground operations surface storage errors.

use fatalog_storage::{NvStorage, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Switches controlling a [`FlakyStorage`].
///
/// Cloned handles control the same storage, so a test can keep one after
/// boxing the storage into a store.
#[derive(Debug, Clone, Default)]
pub struct FaultSwitches {
    fail_map: Arc<AtomicBool>,
    fail_commit: Arc<AtomicBool>,
    failed_commits: Arc<AtomicUsize>,
}

impl FaultSwitches {
    /// Makes the next `map` calls fail.
    pub fn set_fail_on_map(&self, fail: bool) {
        self.fail_map.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `commit` calls fail.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Number of commits that were refused.
    #[must_use]
    pub fn failed_commits(&self) -> usize {
        self.failed_commits.load(Ordering::SeqCst)
    }
}

/// A storage wrapper that can refuse to map or to commit.
pub struct FlakyStorage {
    inner: Box<dyn NvStorage>,
    switches: FaultSwitches,
}

impl FlakyStorage {
    /// Wraps `inner`, initially behaving normally.
    pub fn new(inner: Box<dyn NvStorage>) -> Self {
        Self {
            inner,
            switches: FaultSwitches::default(),
        }
    }

    /// Returns a handle to the failure switches.
    #[must_use]
    pub fn switches(&self) -> FaultSwitches {
        self.switches.clone()
    }
}

impl NvStorage for FlakyStorage {
    fn sector_size(&self) -> usize {
        self.inner.sector_size()
    }

    fn map(&mut self, len: usize) -> StorageResult<()> {
        if self.switches.fail_map.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::OutOfMemory,
                "simulated mirror allocation failure",
            )));
        }
        self.inner.map(len)
    }

    fn mirror(&self) -> StorageResult<&[u8]> {
        self.inner.mirror()
    }

    fn mirror_mut(&mut self) -> StorageResult<&mut [u8]> {
        self.inner.mirror_mut()
    }

    fn commit(&mut self) -> StorageResult<()> {
        if self.switches.fail_commit.load(Ordering::SeqCst) {
            self.switches.failed_commits.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::CommitFailed(
                "simulated flash write failure".to_string(),
            ));
        }
        self.inner.commit()
    }
}
