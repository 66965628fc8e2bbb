//! Scan payload codec
//!
//! A scanned code carries a JSON object. Before it leaves the ground station
//! the object is tagged with the current operating mode:
//! ```text
//! {"item_id": "42", "qty": 3}  ->  {"item_id": "42", "qty": 3, "mode": "inventory"}
//! ```
//!
//! The tagged object is sent as a single UTF-8 datagram with no framing.

use bytes::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::OperatingMode;

/// Field injected into every forwarded payload
pub const MODE_FIELD: &str = "mode";

/// Largest datagram we are willing to emit
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Errors that can occur while tagging or reading a payload
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Payload is JSON but not an object (found {0})")]
    NotAnObject(&'static str),

    #[error("Datagram too large: {0} bytes (max: {MAX_DATAGRAM_SIZE})")]
    DatagramTooLarge(usize),

    #[error("Datagram is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unknown operating mode: {0}")]
    UnknownMode(String),

    #[error("Datagram has no {MODE_FIELD} field")]
    MissingMode,
}

/// Scanned object fields, in their original order
pub type FieldMap = Map<String, Value>;

/// A payload as seen by the receiving side
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPayload {
    pub mode: OperatingMode,
    /// The scanned object, without the mode tag
    pub fields: FieldMap,
}

/// Tag a scanned payload with the operating mode and encode it as a datagram
///
/// An existing `mode` field in the scanned object is overwritten.
pub fn encode(payload: &str, mode: OperatingMode) -> Result<Bytes, CodecError> {
    let value: Value = serde_json::from_str(payload)?;

    let mut object = match value {
        Value::Object(object) => object,
        other => return Err(CodecError::NotAnObject(json_kind(&other))),
    };

    object.insert(MODE_FIELD.to_string(), Value::String(mode.as_str().to_string()));

    let encoded = serde_json::to_vec(&Value::Object(object))?;
    if encoded.len() > MAX_DATAGRAM_SIZE {
        return Err(CodecError::DatagramTooLarge(encoded.len()));
    }

    Ok(Bytes::from(encoded))
}

/// Decode a received datagram back into its mode and scanned fields
pub fn decode(datagram: &[u8]) -> Result<TaggedPayload, CodecError> {
    let text = std::str::from_utf8(datagram).map_err(|_| CodecError::InvalidUtf8)?;
    let value: Value = serde_json::from_str(text)?;

    let mut fields = match value {
        Value::Object(object) => object,
        other => return Err(CodecError::NotAnObject(json_kind(&other))),
    };

    let mode = match fields.remove(MODE_FIELD) {
        Some(Value::String(s)) => s.parse()?,
        Some(_) | None => return Err(CodecError::MissingMode),
    };

    Ok(TaggedPayload { mode, fields })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
