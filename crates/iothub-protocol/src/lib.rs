//! # iothub-protocol
//!
//! Message types and codec for the hub HTTP protocol.
//!
//! The hub speaks JSON request/response bodies over four endpoints:
//! node registration (sensors and actors), sensor data submission, and a
//! registration-liveness probe. This crate owns the wire shapes and the
//! endpoint paths; it performs no I/O.

pub mod codec;
pub mod endpoints;
pub mod messages;

pub use codec::{
    decode_actor_command, decode_register_response, encode_data_submission,
    encode_register_request, CodecError,
};
pub use messages::{ActorCommand, CommandValue, DataSubmission, RegisterRequest, RegisterResponse};
