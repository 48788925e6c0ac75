//! Clear command implementation.

use super::{CliResult, Target};
use tracing::info;

/// Runs the clear command.
pub fn run(target: &Target) -> CliResult<()> {
    let cleared = clear(target)?;
    println!("Cleared {cleared} crash records");
    Ok(())
}

/// Clears the image's store, returning how many records it held.
pub fn clear(target: &Target) -> CliResult<u8> {
    info!("Clearing crash store in {:?}", target.image);
    let mut store = target.open_store()?;
    let previous = store.count();
    store.clear()?;
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::simulate::{record, SimulatedFault};
    use crate::commands::test_support::target;
    use tempfile::tempdir;

    #[test]
    fn clear_empties_image() {
        let dir = tempdir().unwrap();
        let target = target(&dir);
        let fault = SimulatedFault {
            reason: 2,
            cause: 9,
            excvaddr: 0,
            depth: 3,
            stack_base: 0x2000,
            at_millis: 10,
        };
        record(&target, &fault).unwrap();

        assert_eq!(clear(&target).unwrap(), 1);
        assert_eq!(clear(&target).unwrap(), 0);
        assert_eq!(target.open_store().unwrap().free_bytes(), Some(508));
    }
}
