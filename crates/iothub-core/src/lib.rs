//! # iothub-core
//!
//! Core device identity model and non-volatile record store.
//!
//! This crate provides:
//! - The record store abstraction with explicit commit semantics
//!   (in-memory and file-backed implementations)
//! - Boot state tracking (first boot vs. resumed boot)
//! - The fixed-size hub identifier registry and its durable byte layout
//! - Sensor and actor node types
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux (tokio) and embedded targets.

pub mod boot;
pub mod node;
pub mod registry;
pub mod store;

pub use boot::BootTracker;
pub use node::{Actor, ActorBinding, KindMismatch, StateKind, StateValue};
pub use registry::{IdentifierRegistry, NodeId, RegistryError, ID_LEN};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore, StoreError};

/// Maximum length of a sensor or actor display name, in characters.
pub const MAX_NAME_LEN: usize = 100;
