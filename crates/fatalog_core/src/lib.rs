//! # fatalog core
//!
//! Persistent crash records for small devices.
//!
//! When the device hits an unrecoverable fault, the platform's fault hook
//! calls [`Store::record_crash`] with the reset metadata and the range of
//! the faulting stack. The record is appended to a fixed window of the
//! non-volatile medium and committed before the watchdog resets the chip.
//! Later, in normal execution, [`Store::print`] renders everything that
//! was collected and [`Store::clear`] starts over.
//!
//! This crate provides:
//! - Window validation and mirror binding ([`Store::begin`])
//! - The allocation-free fault-path recorder ([`Store::record_crash`])
//! - Sequential read-back with bounds checking ([`Store::report`])
//! - Maintenance ([`Store::clear`], [`Store::count`])
//! - A non-blocking fault hook adapter ([`CrashHook`])
//!
//! ## Example
//!
//! ```rust
//! use fatalog_core::{FaultContext, ResetInfo, StackSnapshot, Store};
//! use fatalog_storage::EmulatedEeprom;
//!
//! let mut store = Store::begin(Box::new(EmulatedEeprom::new(4096)), 0, 512).unwrap();
//!
//! let stack = [0x4020_1000, 0x3fff_fe70, 0, 1];
//! let snapshot = StackSnapshot::new(0x3fff_fe60, &stack);
//! let fault = FaultContext::new(
//!     ResetInfo { reason: 2, exccause: 28, ..ResetInfo::default() },
//!     snapshot.base(),
//!     snapshot.end(),
//!     &snapshot,
//! );
//! store.record_crash(&fault);
//!
//! assert_eq!(store.count(), 1);
//! let mut out = String::new();
//! store.print(&mut out).unwrap();
//! assert!(out.contains("Fatal # 1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod hook;
pub mod layout;
mod platform;
mod recorder;
mod report;
mod store;
mod types;
mod window;

pub use config::{Config, DEFAULT_MIN_STACK_DEPTH};
pub use error::{CoreError, CoreResult};
pub use hook::{CrashHook, FaultHandler};
pub use layout::{Header, RecordHeader};
pub use platform::{Clock, StackMemory, StackSnapshot, UptimeClock};
pub use recorder::{FaultContext, RecordOutcome, SavedRecord};
pub use report::{CrashRecord, Integrity, Occupancy, Report, WORDS_PER_LINE};
pub use store::Store;
pub use types::{ResetInfo, ResetReason};
pub use window::Window;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
