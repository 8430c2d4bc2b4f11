//! # iothub-web
//!
//! Inbound actor-command REST API for the device node.
//!
//! The hub pushes actor state changes to the device over plain HTTP. This
//! crate exposes those routes on Axum and forwards accepted commands into
//! a bounded queue; the agent's tick loop drains the queue one command
//! per tick through the `CommandSource` seam, so the web runtime never
//! touches the agent or the record store directly.

pub mod routes;

// Re-exports
pub use routes::create_router;

use iothub_client::{CommandSource, InboundCommand};
use iothub_core::StateKind;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One declared actor, as advertised on the command API.
#[derive(Debug, Clone, Serialize)]
pub struct ActorInfo {
    pub name: String,
    pub kind: StateKind,
}

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Node display name, shown on the identity page.
    pub node_name: String,
    /// Catalog of declared actors (name + state kind).
    pub actors: Arc<Vec<ActorInfo>>,
    /// Sending half of the command queue.
    pub commands: mpsc::Sender<InboundCommand>,
}

/// Receiving half of the command queue, polled by the agent's tick loop.
pub struct CommandQueue {
    rx: mpsc::Receiver<InboundCommand>,
}

impl CommandSource for CommandQueue {
    fn poll(&mut self) -> Option<InboundCommand> {
        self.rx.try_recv().ok()
    }
}

/// Create a bounded command queue linking the web layer to the tick loop.
pub fn command_channel(capacity: usize) -> (mpsc::Sender<InboundCommand>, CommandQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, CommandQueue { rx })
}
