//! Non-volatile record storage.
//!
//! The record store is the device's only durable memory: a small
//! byte-addressed region with buffered writes and an explicit commit.
//! Higher layers build every multi-byte structure out of single-byte
//! reads and writes followed by one `commit` call — commit is the
//! durability boundary, and uncommitted writes may be lost on power loss.
//!
//! Two implementations are provided:
//! - `MemoryRecordStore` for tests and simulation
//! - `FileRecordStore` for Linux nodes, where a plain file stands in for
//!   the EEPROM/flash region

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Default size of the backing medium in bytes.
///
/// Matches the region a small microcontroller EEPROM typically maps.
pub const DEFAULT_MEDIUM_SIZE: usize = 512;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested region does not fit the backing medium.
    #[error("region of {needed} bytes exceeds medium capacity of {capacity} bytes")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// An address outside the mapped region was accessed.
    #[error("address {address} is outside the mapped region of {capacity} bytes")]
    OutOfBounds { address: usize, capacity: usize },

    /// The backing medium rejected the durable write.
    #[error("commit to backing medium failed: {0}")]
    CommitFailed(String),
}

/// Abstract byte-addressed durable storage with explicit commit.
///
/// `begin` maps the working region and is idempotent; calling it again
/// with the same capacity on every boot is the expected usage. Writes are
/// buffered until `commit` flushes them to the medium.
pub trait RecordStore {
    /// Reserve/map a `capacity`-byte durable region.
    fn begin(&mut self, capacity: usize) -> Result<(), StoreError>;

    /// Read one byte from the region. Sees buffered, uncommitted writes.
    fn read(&self, address: usize) -> Result<u8, StoreError>;

    /// Buffer one byte write. Not durable until `commit`.
    fn write(&mut self, address: usize, byte: u8) -> Result<(), StoreError>;

    /// Flush all buffered writes durably to the medium.
    fn commit(&mut self) -> Result<(), StoreError>;
}

/// In-memory record store.
///
/// Models the buffered/durable split of a real EEPROM: `write` touches the
/// working buffer, `commit` copies it to the durable image. Tests can drop
/// uncommitted writes to simulate power loss, or arm a commit failure to
/// exercise the `CommitFailed` path.
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    medium_size: usize,
    buffer: Vec<u8>,
    durable: Vec<u8>,
    fail_next_commit: bool,
}

impl MemoryRecordStore {
    /// Create a store with the default medium size.
    pub fn new() -> Self {
        Self::with_medium_size(DEFAULT_MEDIUM_SIZE)
    }

    /// Create a store with a custom medium size.
    pub fn with_medium_size(medium_size: usize) -> Self {
        Self {
            medium_size,
            buffer: Vec::new(),
            durable: Vec::new(),
            fail_next_commit: false,
        }
    }

    /// Discard buffered writes, as a power loss before `commit` would.
    pub fn drop_uncommitted(&mut self) {
        self.buffer = self.durable.clone();
    }

    /// Make the next `commit` fail with `CommitFailed`.
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    /// Snapshot of the durable image, for assertions.
    pub fn durable_bytes(&self) -> &[u8] {
        &self.durable
    }

    /// Seed the durable image directly, bypassing the write/commit path.
    ///
    /// Used by tests that model a device booting with pre-existing data.
    pub fn seed(&mut self, bytes: &[u8]) {
        self.durable = bytes.to_vec();
        self.buffer = bytes.to_vec();
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryRecordStore {
    fn begin(&mut self, capacity: usize) -> Result<(), StoreError> {
        if capacity > self.medium_size {
            return Err(StoreError::CapacityExceeded {
                needed: capacity,
                capacity: self.medium_size,
            });
        }
        // Idempotent: growing keeps existing content, nothing is erased.
        if self.buffer.len() < capacity {
            self.buffer.resize(capacity, 0);
        }
        if self.durable.len() < capacity {
            self.durable.resize(capacity, 0);
        }
        Ok(())
    }

    fn read(&self, address: usize) -> Result<u8, StoreError> {
        self.buffer
            .get(address)
            .copied()
            .ok_or(StoreError::OutOfBounds {
                address,
                capacity: self.buffer.len(),
            })
    }

    fn write(&mut self, address: usize, byte: u8) -> Result<(), StoreError> {
        let capacity = self.buffer.len();
        match self.buffer.get_mut(address) {
            Some(cell) => {
                *cell = byte;
                Ok(())
            }
            None => Err(StoreError::OutOfBounds { address, capacity }),
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.fail_next_commit {
            self.fail_next_commit = false;
            return Err(StoreError::CommitFailed("medium rejected write".into()));
        }
        self.durable = self.buffer.clone();
        Ok(())
    }
}

/// File-backed record store for Linux nodes.
///
/// The durable region is a plain file. `begin` loads it (or creates a
/// zero-filled one), `write` updates the working buffer, `commit` rewrites
/// the file and syncs it to disk.
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    medium_size: usize,
    buffer: Vec<u8>,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            medium_size: DEFAULT_MEDIUM_SIZE,
            buffer: Vec::new(),
        }
    }
}

impl RecordStore for FileRecordStore {
    fn begin(&mut self, capacity: usize) -> Result<(), StoreError> {
        if capacity > self.medium_size {
            return Err(StoreError::CapacityExceeded {
                needed: capacity,
                capacity: self.medium_size,
            });
        }
        if self.buffer.len() >= capacity {
            return Ok(());
        }
        let mut bytes = fs::read(&self.path).unwrap_or_default();
        if bytes.len() < capacity {
            bytes.resize(capacity, 0);
        }
        self.buffer = bytes;
        Ok(())
    }

    fn read(&self, address: usize) -> Result<u8, StoreError> {
        self.buffer
            .get(address)
            .copied()
            .ok_or(StoreError::OutOfBounds {
                address,
                capacity: self.buffer.len(),
            })
    }

    fn write(&mut self, address: usize, byte: u8) -> Result<(), StoreError> {
        let capacity = self.buffer.len();
        match self.buffer.get_mut(address) {
            Some(cell) => {
                *cell = byte;
                Ok(())
            }
            None => Err(StoreError::OutOfBounds { address, capacity }),
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let write = |path: &PathBuf, bytes: &[u8]| -> std::io::Result<()> {
            let mut file = fs::File::create(path)?;
            file.write_all(bytes)?;
            file.sync_all()
        };
        write(&self.path, &self.buffer).map_err(|e| StoreError::CommitFailed(e.to_string()))
    }
}
