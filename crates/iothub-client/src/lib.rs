//! # iothub-client
//!
//! Hub registration client and the device agent loop.
//!
//! This crate implements the device side of the hub protocol:
//! - `HubClient` performs the registration handshake and data submission
//!   over an injected `HubTransport`
//! - `DeviceAgent` orchestrates first-boot detection, identifier
//!   persistence, reporting and inbound command dispatch
//!
//! Everything here is synchronous and blocking; the transport and the
//! inbound command source are narrow seams the runtime plugs into.

pub mod agent;
pub mod hub;
pub mod transport;

pub use agent::{
    AgentConfig, AgentError, CommandSource, DeviceAgent, InboundCommand, ReportOutcome,
    TickOutcome,
};
pub use hub::{HubClient, HubError};
pub use transport::{HttpReply, HubTransport, TransportError};
