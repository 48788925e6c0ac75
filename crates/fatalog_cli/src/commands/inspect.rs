//! Inspect command implementation.
//!
//! Reads the window straight from the image, without binding a store,
//! so that damaged headers are shown as stored.

use super::{integrity_name, CliResult, OutputFormat, Target};
use fatalog_core::{Header, Report};
use fatalog_storage::{FileEeprom, NvStorage, StorageError};
use serde::Serialize;

/// Bytes per line of the window dump.
const DUMP_WIDTH: usize = 16;

/// Raw view of the crash store in an image.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Image path.
    pub image: String,
    /// Image file size in bytes.
    pub image_len: u64,
    /// Window offset in the medium.
    pub offset: u16,
    /// Window size.
    pub size: u16,
    /// Record count as stored.
    pub raw_count: u8,
    /// Cursor as stored.
    pub raw_next_offset: u16,
    /// `erased`, `full` or `open`.
    pub state: &'static str,
    /// Layout of each record found.
    pub records: Vec<RecordLayout>,
    /// `intact`, `incomplete` or `inconsistent`.
    pub integrity: &'static str,
    /// Free bytes, absent when the store is full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_bytes: Option<u16>,
    /// Hex dump of the window (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<Vec<String>>,
}

/// Where a record sits in the window.
#[derive(Debug, Serialize)]
pub struct RecordLayout {
    /// 1-based record number.
    pub number: usize,
    /// Window offset of the record.
    pub offset: usize,
    /// Bytes taken by the record.
    pub size: usize,
    /// Stack words announced by the record.
    pub stack_len: u16,
    /// True if every announced word lies inside the window.
    pub complete: bool,
}

/// Runs the inspect command.
pub fn run(target: &Target, format: OutputFormat, dump: bool) -> CliResult<()> {
    let result = inspect(target, dump)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }
    Ok(())
}

/// Reads the window and describes what it holds.
pub fn inspect(target: &Target, dump: bool) -> CliResult<InspectResult> {
    let window = target.config.window;
    window.validate(target.sector_size, target.config.min_stack_depth)?;

    let mut storage = FileEeprom::open(&target.image, target.sector_size)?;
    let image_len = std::fs::metadata(&target.image)
        .map_err(StorageError::from)?
        .len();
    storage.map(window.end())?;
    let mirror = storage.mirror()?;
    let bytes = mirror
        .get(window.range())
        .ok_or(StorageError::OutOfRange {
            offset: window.offset as usize,
            len: window.size as usize,
            size: mirror.len(),
        })?;

    let raw = Header::read(bytes);
    let report = Report::scan(window, bytes);
    let state = if raw.is_erased() {
        "erased"
    } else if raw.is_full() {
        "full"
    } else {
        "open"
    };

    Ok(InspectResult {
        image: target.image.display().to_string(),
        image_len,
        offset: window.offset,
        size: window.size,
        raw_count: raw.count,
        raw_next_offset: raw.next_offset,
        state,
        records: report
            .records
            .iter()
            .map(|record| RecordLayout {
                number: record.number,
                offset: record.offset,
                size: record.header.size(),
                stack_len: record.header.stack_len,
                complete: record.is_complete(),
            })
            .collect(),
        integrity: integrity_name(report.integrity),
        free_bytes: report.free_bytes(),
        dump: dump.then(|| hex_dump(bytes)),
    })
}

fn hex_dump(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(DUMP_WIDTH)
        .enumerate()
        .map(|(line, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
            format!("{:04x}: {}", line * DUMP_WIDTH, hex.join(" "))
        })
        .collect()
}

fn print_text_output(result: &InspectResult) {
    println!("fatalog Store Inspection");
    println!("========================");
    println!();
    println!("Image:  {} ({} bytes)", result.image, result.image_len);
    println!(
        "Window: offset {}, size {} (0x{:04x}..0x{:04x})",
        result.offset,
        result.size,
        result.offset,
        result.offset as usize + result.size as usize
    );
    println!();
    println!("Header:");
    println!("  count:       {} (0x{:02x})", result.raw_count, result.raw_count);
    println!(
        "  next_offset: {} (0x{:04x})",
        result.raw_next_offset, result.raw_next_offset
    );
    println!("  state:       {}", result.state);

    if !result.records.is_empty() {
        println!();
        println!("Records:");
        for record in &result.records {
            println!(
                "  #{} at 0x{:04x}: {} bytes, {} stack words{}",
                record.number,
                record.offset,
                record.size,
                record.stack_len,
                if record.complete { "" } else { " (incomplete)" }
            );
        }
    }

    println!();
    println!("Integrity: {}", result.integrity);
    match result.free_bytes {
        Some(bytes) => println!("Free:      {bytes} bytes"),
        None => println!("Free:      none (store full)"),
    }

    if let Some(dump) = &result.dump {
        println!();
        for line in dump {
            println!("{line}");
        }
    }
}
