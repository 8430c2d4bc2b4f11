//! Sensor and actor node types.
//!
//! An actor's state kind, current value and update callback travel
//! together in one sum type. The discriminant is never separable from the
//! payload, so a kind/value mismatch cannot be constructed — it can only
//! be rejected at the `apply` boundary when an inbound command carries the
//! wrong kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three primitive state kinds an actor can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Int,
    Float,
    Bool,
}

/// A concrete state value of one of the three kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateValue {
    Int(i32),
    Float(f64),
    Bool(bool),
}

impl StateValue {
    pub fn kind(&self) -> StateKind {
        match self {
            StateValue::Int(_) => StateKind::Int,
            StateValue::Float(_) => StateKind::Float,
            StateValue::Bool(_) => StateKind::Bool,
        }
    }
}

/// An inbound value's kind disagrees with the actor's declared kind.
#[derive(Debug, Error)]
#[error("actor expects a {expected:?} state, command carried a {received:?}")]
pub struct KindMismatch {
    pub expected: StateKind,
    pub received: StateKind,
}

/// An actor's state and update callback, bound to one kind.
///
/// Exactly one variant is ever valid for a given actor; the callback
/// signature matches the state type by construction.
pub enum ActorBinding {
    Int {
        state: i32,
        on_update: Box<dyn FnMut(i32) + Send>,
    },
    Float {
        state: f64,
        on_update: Box<dyn FnMut(f64) + Send>,
    },
    Bool {
        state: bool,
        on_update: Box<dyn FnMut(bool) + Send>,
    },
}

impl ActorBinding {
    pub fn kind(&self) -> StateKind {
        match self {
            ActorBinding::Int { .. } => StateKind::Int,
            ActorBinding::Float { .. } => StateKind::Float,
            ActorBinding::Bool { .. } => StateKind::Bool,
        }
    }

    /// The current state value.
    pub fn state(&self) -> StateValue {
        match self {
            ActorBinding::Int { state, .. } => StateValue::Int(*state),
            ActorBinding::Float { state, .. } => StateValue::Float(*state),
            ActorBinding::Bool { state, .. } => StateValue::Bool(*state),
        }
    }

    /// Apply an inbound state value: store it and run the update callback.
    ///
    /// Rejects a value of the wrong kind without mutating anything.
    pub fn apply(&mut self, value: StateValue) -> Result<(), KindMismatch> {
        match (self, value) {
            (ActorBinding::Int { state, on_update }, StateValue::Int(v)) => {
                *state = v;
                on_update(v);
                Ok(())
            }
            (ActorBinding::Float { state, on_update }, StateValue::Float(v)) => {
                *state = v;
                on_update(v);
                Ok(())
            }
            (ActorBinding::Bool { state, on_update }, StateValue::Bool(v)) => {
                *state = v;
                on_update(v);
                Ok(())
            }
            (binding, value) => Err(KindMismatch {
                expected: binding.kind(),
                received: value.kind(),
            }),
        }
    }
}

impl std::fmt::Debug for ActorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorBinding::Int { state, .. } => f.debug_struct("Int").field("state", state).finish(),
            ActorBinding::Float { state, .. } => {
                f.debug_struct("Float").field("state", state).finish()
            }
            ActorBinding::Bool { state, .. } => {
                f.debug_struct("Bool").field("state", state).finish()
            }
        }
    }
}

/// A declared actor: display name plus its state binding.
///
/// The hub-assigned identifier lives in the registry slot of the same
/// index, not here.
#[derive(Debug)]
pub struct Actor {
    pub name: String,
    pub binding: ActorBinding,
}
