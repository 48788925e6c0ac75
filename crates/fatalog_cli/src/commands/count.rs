//! Count command implementation.

use super::{CliResult, Target};

/// Runs the count command.
pub fn run(target: &Target) -> CliResult<()> {
    println!("{}", count(target)?);
    Ok(())
}

/// Number of records in the image's store.
pub fn count(target: &Target) -> CliResult<u8> {
    Ok(target.open_store()?.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::simulate::{record, SimulatedFault};
    use crate::commands::test_support::target;
    use tempfile::tempdir;

    #[test]
    fn missing_image_counts_as_empty() {
        let dir = tempdir().unwrap();
        assert_eq!(count(&target(&dir)).unwrap(), 0);
    }

    #[test]
    fn counts_simulated_faults() {
        let dir = tempdir().unwrap();
        let target = target(&dir);
        let fault = SimulatedFault {
            reason: 2,
            cause: 0,
            excvaddr: 0,
            depth: 2,
            stack_base: 0x1000,
            at_millis: 0,
        };
        record(&target, &fault).unwrap();
        record(&target, &fault).unwrap();
        assert_eq!(count(&target).unwrap(), 2);
    }
}
