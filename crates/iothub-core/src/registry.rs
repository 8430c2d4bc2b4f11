//! Hub identifier registry.
//!
//! A fixed-size table of hub-assigned identifiers, const-generic over the
//! compile-time sensor count `S` and actor count `A`, serialized to the
//! record store as raw bytes.
//!
//! # Durable layout
//!
//! ```text
//! byte 0                        boot flag (owned by BootTracker)
//! bytes [1, 1+24*S)             S sensor identifiers, 24 bytes each
//! bytes [1+24*S, 1+24*(S+A))    A actor identifiers, 24 bytes each
//! ```
//!
//! There is no length prefix, checksum or schema version: the layout is
//! implicit from `S` and `A`. Reading with different counts than were
//! written silently misinterprets the region — a deliberate compatibility
//! hazard carried over from the wire format, demonstrated in the tests.
//!
//! `load` performs no content validation either; a cleared or garbage
//! region yields garbage identifiers. Whether slots are trustworthy is the
//! boot flag's call, not the registry's.

use crate::store::{RecordStore, StoreError};
use thiserror::Error;

/// Length of a hub-assigned identifier slot in bytes.
pub const ID_LEN: usize = 24;

/// Offset of the first identifier slot, past the boot flag byte.
pub const IDS_OFFSET: usize = 1;

/// Errors from registry slot access and persistence.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An identifier does not fit the fixed 24-byte slot.
    #[error("identifier is {len} bytes, slot capacity is {ID_LEN}")]
    IdentifierTooLong { len: usize },

    /// A slot index beyond the configured count was addressed.
    #[error("slot {index} out of range for {count} configured slots")]
    SlotOutOfRange { index: usize, count: usize },

    /// Underlying record store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A hub-assigned identifier: up to 24 opaque bytes, NUL-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId([u8; ID_LEN]);

impl NodeId {
    /// The empty (all-zero) identifier of an unregistered slot.
    pub const EMPTY: NodeId = NodeId([0; ID_LEN]);

    /// Parse an identifier string, rejecting anything over 24 bytes.
    pub fn parse(s: &str) -> Result<Self, RegistryError> {
        let bytes = s.as_bytes();
        if bytes.len() > ID_LEN {
            return Err(RegistryError::IdentifierTooLong { len: bytes.len() });
        }
        let mut raw = [0u8; ID_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(NodeId(raw))
    }

    /// Wrap raw slot bytes as read from storage, unvalidated.
    pub fn from_bytes(raw: [u8; ID_LEN]) -> Self {
        NodeId(raw)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// The identifier with NUL padding trimmed.
    ///
    /// A garbage region decodes to a garbage (possibly empty) string; the
    /// boot flag decides whether slots are trusted at all.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(ID_LEN);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; ID_LEN]
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-size table of sensor and actor identifiers.
///
/// Capacity is static: `S` sensor slots and `A` actor slots, matching the
/// durable layout exactly. Overflow is a rejected operation, never a grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRegistry<const S: usize, const A: usize> {
    sensors: [NodeId; S],
    actors: [NodeId; A],
}

impl<const S: usize, const A: usize> IdentifierRegistry<S, A> {
    /// Bytes of durable region this registry needs, boot flag included.
    pub const fn region_size() -> usize {
        IDS_OFFSET + ID_LEN * (S + A)
    }

    /// Create an empty registry (all slots zeroed).
    pub fn new() -> Self {
        Self {
            sensors: [NodeId::EMPTY; S],
            actors: [NodeId::EMPTY; A],
        }
    }

    /// Populate the in-memory tables from the store.
    ///
    /// Reads `S` sensor identifiers then `A` actor identifiers
    /// sequentially from the fixed offset, one byte at a time. Content is
    /// not validated.
    pub fn load<R: RecordStore>(&mut self, store: &R) -> Result<(), RegistryError> {
        let mut addr = IDS_OFFSET;
        for slot in self.sensors.iter_mut() {
            *slot = Self::read_slot(store, &mut addr)?;
        }
        for slot in self.actors.iter_mut() {
            *slot = Self::read_slot(store, &mut addr)?;
        }
        Ok(())
    }

    /// Write the in-memory tables back in the same order, then commit once.
    pub fn save<R: RecordStore>(&self, store: &mut R) -> Result<(), RegistryError> {
        let mut addr = IDS_OFFSET;
        for slot in self.sensors.iter() {
            Self::write_slot(store, &mut addr, slot)?;
        }
        for slot in self.actors.iter() {
            Self::write_slot(store, &mut addr, slot)?;
        }
        store.commit()?;
        Ok(())
    }

    /// Zero the entire region, boot flag included, then commit.
    ///
    /// Run before a first-boot registration pass so stale partial data
    /// cannot survive underneath freshly assigned identifiers.
    pub fn clear<R: RecordStore>(store: &mut R) -> Result<(), RegistryError> {
        for addr in 0..Self::region_size() {
            store.write(addr, 0)?;
        }
        store.commit()?;
        Ok(())
    }

    pub fn sensor_id(&self, index: usize) -> Result<&NodeId, RegistryError> {
        self.sensors
            .get(index)
            .ok_or(RegistryError::SlotOutOfRange { index, count: S })
    }

    pub fn actor_id(&self, index: usize) -> Result<&NodeId, RegistryError> {
        self.actors
            .get(index)
            .ok_or(RegistryError::SlotOutOfRange { index, count: A })
    }

    /// Set a sensor slot, validating the 24-byte fit.
    pub fn set_sensor_id(&mut self, index: usize, id: &str) -> Result<(), RegistryError> {
        let parsed = NodeId::parse(id)?;
        let slot = self
            .sensors
            .get_mut(index)
            .ok_or(RegistryError::SlotOutOfRange { index, count: S })?;
        *slot = parsed;
        Ok(())
    }

    /// Set an actor slot, validating the 24-byte fit.
    pub fn set_actor_id(&mut self, index: usize, id: &str) -> Result<(), RegistryError> {
        let parsed = NodeId::parse(id)?;
        let slot = self
            .actors
            .get_mut(index)
            .ok_or(RegistryError::SlotOutOfRange { index, count: A })?;
        *slot = parsed;
        Ok(())
    }

    fn read_slot<R: RecordStore>(store: &R, addr: &mut usize) -> Result<NodeId, RegistryError> {
        let mut raw = [0u8; ID_LEN];
        for byte in raw.iter_mut() {
            *byte = store.read(*addr)?;
            *addr += 1;
        }
        Ok(NodeId::from_bytes(raw))
    }

    fn write_slot<R: RecordStore>(
        store: &mut R,
        addr: &mut usize,
        slot: &NodeId,
    ) -> Result<(), RegistryError> {
        for byte in slot.as_bytes() {
            store.write(*addr, *byte)?;
            *addr += 1;
        }
        Ok(())
    }
}

impl<const S: usize, const A: usize> Default for IdentifierRegistry<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use pretty_assertions::assert_eq;

    fn store_for<const S: usize, const A: usize>() -> MemoryRecordStore {
        let mut store = MemoryRecordStore::new();
        store.begin(IdentifierRegistry::<S, A>::region_size()).unwrap();
        store
    }

    #[test]
    fn test_region_size() {
        assert_eq!(IdentifierRegistry::<2, 1>::region_size(), 1 + 24 * 3);
        assert_eq!(IdentifierRegistry::<0, 0>::region_size(), 1);
    }

    #[test]
    fn test_id_validation_boundary() {
        let ok = "A".repeat(24);
        assert_eq!(NodeId::parse(&ok).unwrap().as_str(), ok);

        let too_long = "A".repeat(25);
        assert!(matches!(
            NodeId::parse(&too_long),
            Err(RegistryError::IdentifierTooLong { len: 25 })
        ));
    }

    #[test]
    fn test_short_id_is_nul_padded() {
        let id = NodeId::parse("abc123").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(&id.as_bytes()[..6], b"abc123");
        assert!(id.as_bytes()[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = store_for::<2, 2>();
        let mut registry = IdentifierRegistry::<2, 2>::new();
        registry
            .set_sensor_id(0, "58a3f1b2c4d5e6f708192a3b")
            .unwrap();
        registry
            .set_sensor_id(1, "ZYXWVUTSRQPONMLKJIHGFEDC")
            .unwrap();
        registry.set_actor_id(0, "0123456789abcdefghijklmn").unwrap();
        registry.set_actor_id(1, "short").unwrap();

        registry.save(&mut store).unwrap();

        let mut loaded = IdentifierRegistry::<2, 2>::new();
        loaded.load(&store).unwrap();
        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_layout_sensors_then_actors_at_fixed_offset() {
        let mut store = store_for::<1, 1>();
        let mut registry = IdentifierRegistry::<1, 1>::new();
        registry.set_sensor_id(0, "SSSSSSSSSSSSSSSSSSSSSSSS").unwrap();
        registry.set_actor_id(0, "aaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        registry.save(&mut store).unwrap();

        let bytes = store.durable_bytes();
        assert_eq!(&bytes[1..25], "SSSSSSSSSSSSSSSSSSSSSSSS".as_bytes());
        assert_eq!(&bytes[25..49], "aaaaaaaaaaaaaaaaaaaaaaaa".as_bytes());
    }

    #[test]
    fn test_load_does_not_validate_content() {
        let mut store = store_for::<1, 0>();
        // Garbage region: load must hand it back verbatim, not error.
        let mut seeded = vec![0u8; IdentifierRegistry::<1, 0>::region_size()];
        seeded[1..25].copy_from_slice(&[0xFF; 24]);
        store.seed(&seeded);

        let mut registry = IdentifierRegistry::<1, 0>::new();
        registry.load(&store).unwrap();
        assert_eq!(registry.sensor_id(0).unwrap().as_bytes(), &[0xFF; 24]);
        // Non-UTF8 garbage decodes to an empty display string.
        assert_eq!(registry.sensor_id(0).unwrap().as_str(), "");
    }

    #[test]
    fn test_count_mismatch_silently_misreads() {
        // Written with 2 sensors + 1 actor, read back as 1 sensor + 2
        // actors: no error is raised and the actor table is shifted into
        // what was sensor data. The layout carries no version or count,
        // so this corruption is undetectable by design.
        let mut store = store_for::<2, 1>();
        let mut written = IdentifierRegistry::<2, 1>::new();
        written.set_sensor_id(0, "SENSOR-ZERO-ZERO-ZERO-00").unwrap();
        written.set_sensor_id(1, "SENSOR-ONE-ONE-ONE-ONE-1").unwrap();
        written.set_actor_id(0, "ACTOR-ZERO-ZERO-ZERO-000").unwrap();
        written.save(&mut store).unwrap();

        let mut misread = IdentifierRegistry::<1, 2>::new();
        misread.load(&store).unwrap();
        assert_eq!(misread.actor_id(0).unwrap().as_str(), "SENSOR-ONE-ONE-ONE-ONE-1");
        assert_eq!(misread.actor_id(1).unwrap().as_str(), "ACTOR-ZERO-ZERO-ZERO-000");
    }

    #[test]
    fn test_clear_zeroes_flag_and_table() {
        let mut store = store_for::<1, 1>();
        store.write(0, 128).unwrap();
        for addr in 1..IdentifierRegistry::<1, 1>::region_size() {
            store.write(addr, b'x').unwrap();
        }
        store.commit().unwrap();

        IdentifierRegistry::<1, 1>::clear(&mut store).unwrap();
        assert!(store.durable_bytes()[..IdentifierRegistry::<1, 1>::region_size()]
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut registry = IdentifierRegistry::<1, 0>::new();
        assert!(matches!(
            registry.set_sensor_id(1, "x"),
            Err(RegistryError::SlotOutOfRange { index: 1, count: 1 })
        ));
        assert!(matches!(
            registry.set_actor_id(0, "x"),
            Err(RegistryError::SlotOutOfRange { index: 0, count: 0 })
        ));
    }
}
