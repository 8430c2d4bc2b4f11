//! Wire message types for the hub HTTP protocol.
//!
//! All bodies are JSON objects. Registration carries a display name out
//! and an assigned identifier back; data submission carries a single
//! numeric value; inbound actor commands carry one value of the actor's
//! declared kind.

use iothub_core::{StateKind, StateValue};
use serde::{Deserialize, Serialize};

/// Node creation request, sent to the sensor or actor collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
}

/// Node creation response carrying the hub-assigned identifier.
///
/// The hub may include other fields; only `id` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: String,
}

/// A single sensor reading posted to the data sub-resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSubmission {
    pub value: f64,
}

/// Inbound actor command body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorCommand {
    pub value: CommandValue,
}

/// A command value of one of the three actor state kinds.
///
/// Untagged: a JSON boolean becomes `Bool`, an integer `Int`, any other
/// number `Float`. Variant order matters for the untagged match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    Bool(bool),
    Int(i32),
    Float(f64),
}

impl CommandValue {
    pub fn kind(&self) -> StateKind {
        match self {
            CommandValue::Bool(_) => StateKind::Bool,
            CommandValue::Int(_) => StateKind::Int,
            CommandValue::Float(_) => StateKind::Float,
        }
    }
}

impl From<CommandValue> for StateValue {
    fn from(value: CommandValue) -> Self {
        match value {
            CommandValue::Bool(b) => StateValue::Bool(b),
            CommandValue::Int(i) => StateValue::Int(i),
            CommandValue::Float(f) => StateValue::Float(f),
        }
    }
}
