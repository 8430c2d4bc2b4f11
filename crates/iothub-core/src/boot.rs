//! Boot state tracking.
//!
//! One reserved byte at address 0 of the record store decides the boot
//! path: `128` means the device has completed first-boot registration and
//! may load its identifiers from storage; any other value forces the
//! registration handshake. Registration progress itself is never
//! persisted — a crash mid-registration leaves the flag unset, which
//! safely re-enters registration on the next boot.

use crate::store::{RecordStore, StoreError};

/// Address of the boot flag byte.
pub const BOOT_FLAG_ADDR: usize = 0;

/// Flag value marking a completed first-boot registration.
pub const BOOT_COMPLETE: u8 = 128;

/// Sentinel written to force the registration path.
pub const BOOT_PENDING: u8 = 0;

/// First-boot detection over any record store.
pub struct BootTracker;

impl BootTracker {
    /// True iff the device has not completed first-boot registration.
    pub fn is_first_boot<R: RecordStore>(store: &R) -> Result<bool, StoreError> {
        Ok(store.read(BOOT_FLAG_ADDR)? != BOOT_COMPLETE)
    }

    /// Record that first-boot registration completed. Idempotent.
    pub fn mark_boot_complete<R: RecordStore>(store: &mut R) -> Result<(), StoreError> {
        if store.read(BOOT_FLAG_ADDR)? == BOOT_COMPLETE {
            return Ok(());
        }
        store.write(BOOT_FLAG_ADDR, BOOT_COMPLETE)?;
        store.commit()
    }

    /// Force the registration path on the next boot. Idempotent.
    pub fn force_first_boot<R: RecordStore>(store: &mut R) -> Result<(), StoreError> {
        if store.read(BOOT_FLAG_ADDR)? == BOOT_PENDING {
            return Ok(());
        }
        store.write(BOOT_FLAG_ADDR, BOOT_PENDING)?;
        store.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;

    fn store() -> MemoryRecordStore {
        let mut store = MemoryRecordStore::new();
        store.begin(16).unwrap();
        store
    }

    #[test]
    fn test_fresh_store_is_first_boot() {
        let store = store();
        assert!(BootTracker::is_first_boot(&store).unwrap());
    }

    #[test]
    fn test_any_value_but_128_is_first_boot() {
        let mut store = store();
        store.write(BOOT_FLAG_ADDR, 17).unwrap();
        store.commit().unwrap();
        assert!(BootTracker::is_first_boot(&store).unwrap());
    }

    #[test]
    fn test_mark_boot_complete_is_idempotent() {
        let mut store = store();
        BootTracker::mark_boot_complete(&mut store).unwrap();
        BootTracker::mark_boot_complete(&mut store).unwrap();
        BootTracker::mark_boot_complete(&mut store).unwrap();
        assert!(!BootTracker::is_first_boot(&store).unwrap());
        assert_eq!(store.durable_bytes()[BOOT_FLAG_ADDR], BOOT_COMPLETE);
    }

    #[test]
    fn test_force_first_boot_is_idempotent() {
        let mut store = store();
        BootTracker::mark_boot_complete(&mut store).unwrap();
        BootTracker::force_first_boot(&mut store).unwrap();
        BootTracker::force_first_boot(&mut store).unwrap();
        assert!(BootTracker::is_first_boot(&store).unwrap());
        assert_eq!(store.durable_bytes()[BOOT_FLAG_ADDR], BOOT_PENDING);
    }

    #[test]
    fn test_flag_survives_power_loss_only_after_commit() {
        let mut store = store();
        store.write(BOOT_FLAG_ADDR, BOOT_COMPLETE).unwrap();
        // No commit: the flag write is lost and the next boot re-registers.
        store.drop_uncommitted();
        assert!(BootTracker::is_first_boot(&store).unwrap());
    }
}
