//! Benchmark utilities.

use fatalog_core::{Config, ResetInfo, Store};
use fatalog_storage::EmulatedEeprom;
use fatalog_testkit::{sample_reset_info, StackImage, TEST_SECTOR_SIZE};

/// Opens a store on a fresh emulated sector.
///
/// # Panics
///
/// Panics if the window does not fit the test sector.
#[must_use]
pub fn emulated_store(size: u16) -> Store {
    Store::open(
        Box::new(EmulatedEeprom::new(TEST_SECTOR_SIZE)),
        Config::new(0, size),
    )
    .unwrap()
}

/// A stack image of `depth` words and matching reset metadata.
#[must_use]
pub fn fault_input(depth: usize) -> (StackImage, ResetInfo) {
    (
        StackImage::counting(0x3FFF_F000, depth),
        sample_reset_info(depth as u32),
    )
}

/// Fills `store` with records of `depth` words until it is full.
pub fn fill(store: &mut Store, depth: usize) {
    let (image, info) = fault_input(depth);
    while !store.is_full() {
        store.record_crash(&image.fault(info));
    }
}
