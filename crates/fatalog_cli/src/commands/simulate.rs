//! Simulate command implementation.
//!
//! Records a synthetic fault into the image, for exercising tooling
//! without real hardware.

use super::{CliResult, Target};
use fatalog_core::{Clock, FaultContext, RecordOutcome, ResetInfo, StackSnapshot};
use tracing::info;

/// Synthetic fault parameters.
#[derive(Debug, Clone)]
pub struct SimulatedFault {
    /// Reason of restart.
    pub reason: u32,
    /// Exception cause.
    pub cause: u32,
    /// Faulting virtual address.
    pub excvaddr: u32,
    /// Stack words to capture.
    pub depth: u16,
    /// Address of the first stack word.
    pub stack_base: u32,
    /// Timestamp to record, in milliseconds.
    pub at_millis: u32,
}

struct At(u32);

impl Clock for At {
    fn millis(&self) -> u32 {
        self.0
    }
}

/// Runs the simulate command.
pub fn run(target: &Target, fault: &SimulatedFault) -> CliResult<()> {
    let outcome = record(target, fault)?;
    match outcome {
        RecordOutcome::Saved(saved) => {
            println!(
                "Recorded fault #{} at offset {} ({} stack words{})",
                saved.number,
                saved.offset,
                saved.stack_len,
                if saved.truncated { ", truncated" } else { "" }
            );
            if saved.filled_store {
                println!("Store is now full");
            }
        }
        RecordOutcome::Unpersisted(saved) => {
            println!("Fault #{} was not written to the image", saved.number);
        }
        RecordOutcome::StoreFull => println!("Fatal store full, nothing recorded"),
        RecordOutcome::Busy | RecordOutcome::Unmapped => {
            println!("Store unavailable, nothing recorded");
        }
    }
    Ok(())
}

/// Records `fault` into the image.
pub fn record(target: &Target, fault: &SimulatedFault) -> CliResult<RecordOutcome> {
    info!("Simulating fault in {:?}", target.image);

    let words: Vec<u32> = (0..u32::from(fault.depth))
        .map(|i| 0x4020_0000 | (i * 4))
        .collect();
    let snapshot = StackSnapshot::new(fault.stack_base, &words);
    let reset_info = ResetInfo {
        reason: fault.reason,
        exccause: fault.cause,
        epc1: words.first().copied().unwrap_or(0x4020_0000),
        excvaddr: fault.excvaddr,
        ..ResetInfo::default()
    };

    let mut store = target.open_store()?.with_clock(At(fault.at_millis));
    Ok(store.record_crash(&FaultContext::new(
        reset_info,
        snapshot.base(),
        snapshot.end(),
        &snapshot,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::target;
    use tempfile::tempdir;

    fn fault(depth: u16) -> SimulatedFault {
        SimulatedFault {
            reason: 2,
            cause: 28,
            excvaddr: 0,
            depth,
            stack_base: 0x3FFF_FE00,
            at_millis: 1500,
        }
    }

    #[test]
    fn records_into_image() {
        let dir = tempdir().unwrap();
        let target = target(&dir);

        let outcome = record(&target, &fault(6)).unwrap();
        let saved = outcome.saved().unwrap();
        assert!(outcome.is_persisted());
        assert_eq!(saved.number, 1);
        assert_eq!(saved.stack_len, 6);

        let store = target.open_store().unwrap();
        let report = store.report();
        assert_eq!(report.records[0].header.timestamp, 1500);
        assert_eq!(report.records[0].stack[1], 0x4020_0004);
    }

    #[test]
    fn stops_when_full() {
        let dir = tempdir().unwrap();
        let target = target(&dir);
        while record(&target, &fault(40)).unwrap() != RecordOutcome::StoreFull {}
        assert!(target.open_store().unwrap().is_full());
    }
}
