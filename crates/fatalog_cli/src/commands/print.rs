//! Print command implementation.

use super::{integrity_name, CliResult, OutputFormat, Target};
use fatalog_core::{CrashRecord, Report};
use serde::Serialize;

/// Stored records in machine-readable form.
#[derive(Debug, Serialize)]
pub struct PrintResult {
    /// Image path.
    pub image: String,
    /// Window offset in the medium.
    pub offset: u16,
    /// Window size.
    pub size: u16,
    /// Records in the order they were written.
    pub records: Vec<RecordOutput>,
    /// `intact`, `incomplete` or `inconsistent`.
    pub integrity: &'static str,
    /// Free bytes, absent when the store is full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_bytes: Option<u16>,
    /// True if the store accepts no more records.
    pub full: bool,
}

/// One record in machine-readable form.
#[derive(Debug, Serialize)]
pub struct RecordOutput {
    /// 1-based record number.
    pub number: usize,
    /// Window offset of the record.
    pub offset: usize,
    /// Milliseconds since boot at the time of the fault.
    pub timestamp_ms: u32,
    /// Reason of restart.
    pub reason: u32,
    /// Label of a known reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_label: Option<&'static str>,
    /// Exception cause.
    pub exccause: u32,
    /// Level-1 exception program counter.
    pub epc1: u32,
    /// Level-2 exception program counter.
    pub epc2: u32,
    /// Level-3 exception program counter.
    pub epc3: u32,
    /// Faulting virtual address.
    pub excvaddr: u32,
    /// Double exception program counter.
    pub depc: u32,
    /// Address of the first stack word.
    pub stack_start: u32,
    /// Stack words announced by the record.
    pub stack_len: u16,
    /// Stack words actually read.
    pub stack: Vec<u32>,
}

impl From<&CrashRecord> for RecordOutput {
    fn from(record: &CrashRecord) -> Self {
        let info = &record.header.reset_info;
        Self {
            number: record.number,
            offset: record.offset,
            timestamp_ms: record.header.timestamp,
            reason: info.reason,
            reason_label: info.reset_reason().map(|reason| reason.label()),
            exccause: info.exccause,
            epc1: info.epc1,
            epc2: info.epc2,
            epc3: info.epc3,
            excvaddr: info.excvaddr,
            depc: info.depc,
            stack_start: record.header.stack_start,
            stack_len: record.header.stack_len,
            stack: record.stack.clone(),
        }
    }
}

impl PrintResult {
    fn new(target: &Target, report: &Report) -> Self {
        Self {
            image: target.image.display().to_string(),
            offset: report.window.offset,
            size: report.window.size,
            records: report.records.iter().map(RecordOutput::from).collect(),
            integrity: integrity_name(report.integrity),
            free_bytes: report.free_bytes(),
            full: report.free_bytes().is_none(),
        }
    }
}

/// Runs the print command.
pub fn run(target: &Target, format: OutputFormat) -> CliResult<()> {
    print!("{}", render(target, format)?);
    Ok(())
}

/// Renders the image's records in `format`.
pub fn render(target: &Target, format: OutputFormat) -> CliResult<String> {
    let store = target.open_store()?;
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            store.print(&mut out)?;
            Ok(out)
        }
        OutputFormat::Json => {
            let result = PrintResult::new(target, &store.report());
            let mut out = serde_json::to_string_pretty(&result)?;
            out.push('\n');
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::simulate::{record, SimulatedFault};
    use crate::commands::test_support::target;
    use tempfile::tempdir;

    fn fault(depth: u16) -> SimulatedFault {
        SimulatedFault {
            reason: 2,
            cause: 28,
            excvaddr: 0x10,
            depth,
            stack_base: 0x3FFF_FE00,
            at_millis: 250,
        }
    }

    #[test]
    fn text_matches_store_rendering() {
        let dir = tempdir().unwrap();
        let target = target(&dir);
        record(&target, &fault(5)).unwrap();

        let out = render(&target, OutputFormat::Text).unwrap();
        assert!(out.starts_with("\nFatal # 1 at 250 ms\n"));
        assert!(out.contains("Reason of restart: 2 (exception)\n"));
        assert!(out.contains("Exception cause: 28\n"));
        assert!(out.contains("3ffffe00: 40200000 40200004 40200008 4020000c\n"));
        assert!(out.ends_with("448 bytes free\n"));
    }

    #[test]
    fn json_lists_records() {
        let dir = tempdir().unwrap();
        let target = target(&dir);
        record(&target, &fault(3)).unwrap();
        record(&target, &fault(1)).unwrap();

        let out = render(&target, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["records"].as_array().unwrap().len(), 2);
        assert_eq!(value["records"][0]["stack_len"], 3);
        assert_eq!(value["records"][0]["reason_label"], "exception");
        assert_eq!(value["records"][1]["offset"], 56);
        assert_eq!(value["integrity"], "intact");
        assert_eq!(value["full"], false);
    }
}
