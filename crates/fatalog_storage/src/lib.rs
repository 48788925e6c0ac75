//! # fatalog storage
//!
//! Non-volatile medium abstraction for the fatalog crash store.
//!
//! A medium is modelled the way small microcontrollers expose emulated
//! EEPROM: one erase sector of fixed size, a RAM mirror that is mapped
//! once at startup and then read and modified freely, and an explicit
//! `commit` that writes the mirror back to durable media.
//!
//! Backends are **opaque byte stores** - they know nothing about crash
//! headers or records.
//!
//! ## Available Backends
//!
//! - [`EmulatedEeprom`] - In-memory sector, for tests and host simulation
//! - [`FileEeprom`] - Sector image kept in a file on the host
//!
//! ## Example
//!
//! ```rust
//! use fatalog_storage::{EmulatedEeprom, NvStorage, ERASED_BYTE};
//!
//! let mut eeprom = EmulatedEeprom::new(4096);
//! eeprom.map(64).unwrap();
//! assert_eq!(eeprom.mirror().unwrap()[0], ERASED_BYTE);
//!
//! eeprom.write(0, b"boot").unwrap();
//! eeprom.commit().unwrap();
//! assert_eq!(&eeprom.media()[..4], b"boot");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{NvStorage, ERASED_BYTE};
pub use error::{StorageError, StorageResult};
pub use file::FileEeprom;
pub use memory::{EepromMedia, EmulatedEeprom};
