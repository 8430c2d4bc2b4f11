//! JSON codec for hub protocol bodies.
//!
//! Encoding and decoding live here so the client crate never touches
//! serde_json directly. Decoding the registration response is tolerant:
//! any JSON object carrying a string `id` field is accepted, everything
//! else in the body is ignored.

use crate::messages::{ActorCommand, DataSubmission, RegisterRequest};
use thiserror::Error;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON (de)serialization failed.
    #[error("failed to encode or decode message: {0}")]
    Json(#[from] serde_json::Error),

    /// The registration response carries no usable `id` field.
    #[error("registration response carries no id field")]
    MissingId,
}

/// Encode a node creation request body.
pub fn encode_register_request(name: &str) -> Result<String, CodecError> {
    let req = RegisterRequest {
        name: name.to_string(),
    };
    serde_json::to_string(&req).map_err(CodecError::from)
}

/// Extract the hub-assigned identifier from a registration response body.
pub fn decode_register_response(body: &str) -> Result<String, CodecError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    match value.get("id").and_then(|id| id.as_str()) {
        Some(id) => Ok(id.to_string()),
        None => Err(CodecError::MissingId),
    }
}

/// Encode a sensor data submission body.
pub fn encode_data_submission(value: f64) -> Result<String, CodecError> {
    let body = DataSubmission { value };
    serde_json::to_string(&body).map_err(CodecError::from)
}

/// Decode an inbound actor command body.
pub fn decode_actor_command(body: &str) -> Result<ActorCommand, CodecError> {
    serde_json::from_str(body).map_err(CodecError::from)
}
