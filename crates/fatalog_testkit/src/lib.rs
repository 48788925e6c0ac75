//! # fatalog testkit
//!
//! Test utilities for fatalog.
//!
//! This crate provides:
//! - Fixtures: a settable clock, owned stack images, stores over emulated media
//! - A medium wrapper that fails on demand
//! - Property-based test generators using proptest
//!
//! Cross-crate scenario tests live in this crate's `tests/` directory.
//!
//! ## Usage
//!
//! ```rust
//! use fatalog_testkit::prelude::*;
//!
//! let mut test = TestStore::open(0, 512);
//! let stack = StackImage::counting(0x3fff_f000, 5);
//! test.store.record_crash(&stack.fault(sample_reset_info(1)));
//! assert_eq!(test.store.count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
