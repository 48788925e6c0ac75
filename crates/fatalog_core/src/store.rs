//! The crash store: window binding and maintenance.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::layout::{Header, ERASED_COUNT, HEADER_SIZE};
use crate::platform::{Clock, UptimeClock};
use crate::window::Window;
use fatalog_storage::{NvStorage, StorageError};
use tracing::{debug, info};

/// A crash record store bound to a window of a non-volatile medium.
///
/// A `Store` only exists after a successful [`Store::begin`] or
/// [`Store::open`], so every other operation can rely on a validated
/// window and a mapped mirror. The header is decoded from the mirror on
/// every access and never cached.
///
/// Foreground operations ([`report`](Store::report),
/// [`print`](Store::print), [`clear`](Store::clear),
/// [`count`](Store::count)) and the fault path
/// ([`record_crash`](Store::record_crash)) must not run concurrently.
/// [`CrashHook`](crate::CrashHook) arranges that for platform hooks.
pub struct Store {
    storage: Box<dyn NvStorage>,
    config: Config,
    pub(crate) clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("header", &self.header())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens the store on `size` bytes starting at `offset` of the medium.
    ///
    /// Shorthand for [`Store::open`] with default limits.
    ///
    /// # Errors
    ///
    /// See [`Store::open`].
    pub fn begin(storage: Box<dyn NvStorage>, offset: u16, size: u16) -> CoreResult<Self> {
        Self::open(storage, Config::new(offset, size))
    }

    /// Validates the window and maps the medium's RAM mirror.
    ///
    /// The mirror is allocated here, at startup, so that the fault path
    /// never has to allocate.
    ///
    /// # Errors
    ///
    /// - [`CoreError::WindowOutOfBounds`] if the window does not fit the medium
    /// - [`CoreError::WindowTooSmall`] if the window cannot hold one record
    /// - [`CoreError::MirrorUnavailable`] if the medium cannot be mapped
    pub fn open(mut storage: Box<dyn NvStorage>, config: Config) -> CoreResult<Self> {
        let window = config.window;
        window.validate(storage.sector_size(), config.min_stack_depth)?;

        storage
            .map(window.end())
            .map_err(CoreError::mirror_unavailable)?;
        let mapped = storage
            .mirror_mut()
            .map_err(CoreError::mirror_unavailable)?
            .len();
        if mapped < window.end() {
            return Err(CoreError::mirror_unavailable(StorageError::OutOfRange {
                offset: window.offset as usize,
                len: window.size as usize,
                size: mapped,
            }));
        }

        let store = Self {
            storage,
            config,
            clock: Box::new(UptimeClock::new()),
        };
        info!(
            offset = window.offset,
            size = window.size,
            records = store.count(),
            "crash store opened"
        );
        Ok(store)
    }

    /// Replaces the clock used to stamp records.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Returns the window owned by the store.
    #[must_use]
    pub fn window(&self) -> Window {
        self.config.window
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decodes the current header from the mirror.
    ///
    /// An unreadable mirror reads like an erased medium.
    #[must_use]
    pub fn header(&self) -> Header {
        self.window_bytes().map_or(
            Header {
                count: ERASED_COUNT,
                next_offset: u16::MAX,
            },
            Header::read,
        )
    }

    /// Number of records stored. An erased store holds none.
    #[must_use]
    pub fn count(&self) -> u8 {
        let header = self.header();
        if header.is_erased() {
            0
        } else {
            header.count
        }
    }

    /// True once the header has been written at least once.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.header().is_erased()
    }

    /// True if the store refuses further records until cleared.
    #[must_use]
    pub fn is_full(&self) -> bool {
        let header = self.header();
        !header.is_erased() && header.is_full()
    }

    /// Bytes left for records, or `None` when full.
    #[must_use]
    pub fn free_bytes(&self) -> Option<u16> {
        let header = self.header();
        let size = self.config.window.size;
        if header.is_erased() {
            Some(size - HEADER_SIZE as u16)
        } else if header.is_full() {
            None
        } else {
            Some(size.saturating_sub(header.next_offset))
        }
    }

    /// Forgets all records and commits the empty header.
    ///
    /// Record bytes are not erased; only the header is reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror is unavailable or the commit fails.
    pub fn clear(&mut self) -> CoreResult<()> {
        let previous = self.count();
        Header::empty().write(self.window_bytes_mut()?);
        self.storage.commit()?;
        info!(cleared = previous, "crash store cleared");
        Ok(())
    }

    /// Releases the medium.
    #[must_use]
    pub fn into_storage(self) -> Box<dyn NvStorage> {
        debug!("crash store closed");
        self.storage
    }

    pub(crate) fn window_bytes(&self) -> Option<&[u8]> {
        let range = self.config.window.range();
        self.storage.mirror().ok()?.get(range)
    }

    pub(crate) fn window_bytes_mut(&mut self) -> Result<&mut [u8], StorageError> {
        let window = self.config.window;
        let mirror = self.storage.mirror_mut()?;
        let size = mirror.len();
        mirror
            .get_mut(window.range())
            .ok_or(StorageError::OutOfRange {
                offset: window.offset as usize,
                len: window.size as usize,
                size,
            })
    }

    pub(crate) fn commit(&mut self) -> Result<(), StorageError> {
        self.storage.commit()
    }
}
