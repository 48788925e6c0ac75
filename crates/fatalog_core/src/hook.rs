//! Adapter between the platform fault hook and the store.

use crate::recorder::{FaultContext, RecordOutcome};
use crate::store::Store;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Something the platform can invoke once per fault, before reset.
pub trait FaultHandler: Send + Sync {
    /// Records the fault. Must not block.
    fn on_fault(&self, fault: &FaultContext<'_>) -> RecordOutcome;
}

/// Shares one [`Store`] between foreground code and the fault hook.
///
/// The fault path only ever tries the lock. If foreground code holds the
/// store when a fault hits, the fault is dropped with
/// [`RecordOutcome::Busy`] instead of deadlocking the handler.
#[derive(Debug, Clone)]
pub struct CrashHook {
    store: Arc<Mutex<Store>>,
}

impl CrashHook {
    /// Wraps an opened store.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Locks the store for foreground use (report, clear, count).
    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock()
    }
}

impl FaultHandler for CrashHook {
    fn on_fault(&self, fault: &FaultContext<'_>) -> RecordOutcome {
        match self.store.try_lock() {
            Some(mut store) => store.record_crash(fault),
            None => RecordOutcome::Busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StackSnapshot;
    use crate::types::ResetInfo;
    use fatalog_storage::EmulatedEeprom;

    fn hook() -> CrashHook {
        let store = Store::begin(Box::new(EmulatedEeprom::new(1024)), 0, 256).unwrap();
        CrashHook::new(store)
    }

    #[test]
    fn hook_records_through_shared_store() {
        let hook = hook();
        let stack = [1, 2, 3];
        let snapshot = StackSnapshot::new(0x100, &stack);
        let fault = FaultContext::new(ResetInfo::default(), 0x100, snapshot.end(), &snapshot);

        assert!(hook.on_fault(&fault).is_persisted());
        assert_eq!(hook.store().count(), 1);
    }

    #[test]
    fn hook_never_blocks_on_held_store() {
        let hook = hook();
        let snapshot = StackSnapshot::new(0x100, &[]);
        let fault = FaultContext::new(ResetInfo::default(), 0x100, 0x100, &snapshot);

        let guard = hook.store();
        assert_eq!(hook.on_fault(&fault), RecordOutcome::Busy);
        drop(guard);

        assert!(hook.on_fault(&fault).is_persisted());
    }

    #[test]
    fn clones_share_the_store() {
        let hook = hook();
        let other = hook.clone();
        let snapshot = StackSnapshot::new(0, &[]);
        let fault = FaultContext::new(ResetInfo::default(), 0, 0, &snapshot);

        other.on_fault(&fault);
        assert_eq!(hook.store().count(), 1);
        hook.store().clear().unwrap();
        assert_eq!(other.store().count(), 0);
    }
}
