//! CLI command implementations.

pub mod clear;
pub mod count;
pub mod inspect;
pub mod print;
pub mod simulate;

use clap::ValueEnum;
use fatalog_core::{Config, CoreError, Integrity, Store};
use fatalog_storage::{FileEeprom, StorageError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// No `--image` was given.
    #[error("image path required (--image)")]
    MissingImage,

    /// Opening or maintaining the store failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading or writing the image failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// JSON serialization failed.
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Rendering the text report failed.
    #[error("text output failed: {0}")]
    Render(#[from] std::fmt::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// The image file and the window the store lives in.
#[derive(Debug, Clone)]
pub struct Target {
    /// Sector image file.
    pub image: PathBuf,
    /// Size of the emulated sector.
    pub sector_size: usize,
    /// Store configuration.
    pub config: Config,
}

impl Target {
    /// Opens the image and binds a store to the window.
    pub fn open_store(&self) -> CliResult<Store> {
        let storage = FileEeprom::open(&self.image, self.sector_size)?;
        Ok(Store::open(Box::new(storage), self.config.clone())?)
    }
}

/// Short name of an integrity verdict, used in JSON output.
pub(crate) fn integrity_name(integrity: Integrity) -> &'static str {
    match integrity {
        Integrity::Intact => "intact",
        Integrity::Incomplete { .. } => "incomplete",
        Integrity::Inconsistent { .. } => "inconsistent",
    }
}
