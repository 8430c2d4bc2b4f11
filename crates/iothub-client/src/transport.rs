//! Hub transport seam.
//!
//! The HTTP exchange itself (sockets, TLS, timeouts) is an external
//! collaborator. The client consumes it through this narrow trait so the
//! handshake logic can run against an in-memory fake in tests and against
//! a real HTTP client on a node.

use thiserror::Error;

/// Network/HTTP layer failure, propagated unchanged to the caller.
///
/// The client never retries internally; retry and restart policy belong
/// to the tick loop.
#[derive(Debug, Error)]
#[error("hub transport failure: {0}")]
pub struct TransportError(pub String);

/// A completed HTTP exchange: status code plus response body.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Blocking HTTP exchange with the hub.
///
/// `path` is relative to the hub base address (e.g. `/api/sensors`);
/// bodies are JSON and implementations must send
/// `Content-Type: application/json`.
pub trait HubTransport {
    fn post_json(&mut self, path: &str, body: &str) -> Result<HttpReply, TransportError>;

    fn get(&mut self, path: &str) -> Result<HttpReply, TransportError>;
}
