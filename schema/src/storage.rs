//! Conversion between the in-memory lesson document and the text column it is
//! stored in. The column is opaque: nothing checks its shape on the way in.

use serde_json::Value;

/// Storage form of a lesson document. A JSON string is assumed to already be the
/// stored text and passes through unchanged; anything else is serialized.
pub fn to_storage_string(content: Value) -> String {
    match content {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Reads a stored document back. Text that is not JSON is returned as a JSON string
/// so callers always get something renderable.
pub fn from_storage_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
