//! Test fixtures and store helpers.
//!
//! Provides a controllable clock, owned stack images and stores over
//! emulated media that can be "rebooted".

use fatalog_core::{Clock, Config, FaultContext, ResetInfo, StackMemory, StackSnapshot, Store};
use fatalog_storage::{EepromMedia, EmulatedEeprom};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Sector size used by the fixtures, matching a typical flash sector.
pub const TEST_SECTOR_SIZE: usize = 4096;

/// A clock whose time is set by the test.
///
/// Clones share the same time, so a test can keep one handle after
/// moving another into a store.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    millis: Arc<AtomicU32>,
}

impl FixedClock {
    /// Creates a clock reading `millis`.
    #[must_use]
    pub fn at(millis: u32) -> Self {
        Self {
            millis: Arc::new(AtomicU32::new(millis)),
        }
    }

    /// Sets the current time.
    pub fn set(&self, millis: u32) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Moves time forward.
    pub fn advance(&self, millis: u32) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn millis(&self) -> u32 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// An owned stack image to fault with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackImage {
    /// Address of the first word.
    pub base: u32,
    /// Captured words.
    pub words: Vec<u32>,
}

impl StackImage {
    /// Creates an image from explicit words.
    #[must_use]
    pub fn new(base: u32, words: Vec<u32>) -> Self {
        Self { base, words }
    }

    /// Creates `depth` recognizable words: the high half is the base's
    /// high half, the low half counts up.
    #[must_use]
    pub fn counting(base: u32, depth: usize) -> Self {
        let words = (0..depth)
            .map(|i| (base & 0xFFFF_0000) | (i as u32 & 0xFFFF))
            .collect();
        Self { base, words }
    }

    /// One past the last word's address.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.snapshot().end()
    }

    /// Borrows the image as stack memory.
    #[must_use]
    pub fn snapshot(&self) -> StackSnapshot<'_> {
        StackSnapshot::new(self.base, &self.words)
    }

    /// A fault context covering the whole image.
    #[must_use]
    pub fn fault(&self, reset_info: ResetInfo) -> FaultContext<'_> {
        FaultContext::new(reset_info, self.base, self.end(), self)
    }
}

impl StackMemory for StackImage {
    fn read_word(&self, addr: u32) -> Option<u32> {
        self.snapshot().read_word(addr)
    }
}

/// A plausible exception reset, varied by `seed`.
#[must_use]
pub fn sample_reset_info(seed: u32) -> ResetInfo {
    ResetInfo {
        reason: 2,
        exccause: seed % 30,
        epc1: 0x4020_0000 | (seed << 4),
        epc2: 0,
        epc3: 0,
        excvaddr: seed.wrapping_mul(4),
        depc: 0,
    }
}

/// A store over emulated media, with handles to the media and clock.
pub struct TestStore {
    /// The store under test.
    pub store: Store,
    /// Durable side of the medium.
    pub media: EepromMedia,
    /// The store's clock.
    pub clock: FixedClock,
    config: Config,
}

impl TestStore {
    /// Opens a store on a freshly erased sector.
    ///
    /// # Panics
    ///
    /// Panics if the window is invalid for [`TEST_SECTOR_SIZE`].
    #[must_use]
    pub fn open(offset: u16, size: u16) -> Self {
        Self::with_config(Config::new(offset, size))
    }

    /// Opens a store with a full configuration on a freshly erased sector.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid for [`TEST_SECTOR_SIZE`].
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self::on_media(EepromMedia::erased(TEST_SECTOR_SIZE), config)
    }

    /// Opens a store over existing media.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid for the media.
    #[must_use]
    pub fn on_media(media: EepromMedia, config: Config) -> Self {
        Self::build(media, config, FixedClock::at(0))
    }

    fn build(media: EepromMedia, config: Config, clock: FixedClock) -> Self {
        let store = Store::open(Box::new(EmulatedEeprom::on_media(media.clone())), config.clone())
            .expect("Failed to open test store")
            .with_clock(clock.clone());
        Self {
            store,
            media,
            clock,
            config,
        }
    }

    /// Drops the store and opens a new one on the same media, discarding
    /// any uncommitted mirror changes.
    #[must_use]
    pub fn reboot(self) -> Self {
        let Self {
            store,
            media,
            clock,
            config,
        } = self;
        drop(store);
        Self::build(media, config, clock)
    }

    /// Renders the store to a string.
    #[must_use]
    pub fn printed(&self) -> String {
        let mut out = String::new();
        self.store
            .print(&mut out)
            .expect("Writing to a String cannot fail");
        out
    }
}
