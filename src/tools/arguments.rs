//! Decoding of model-produced tool arguments.

use crate::error::SwarmError;

/// A JSON object of tool arguments.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Decode tool-call arguments into a JSON object.
///
/// Accepts an object, a JSON string holding an object, or null / an empty
/// string (no arguments). Everything else is a decoding error.
pub fn decode_arguments(tool_name: &str, value: &serde_json::Value) -> Result<JsonObject, SwarmError> {
    match value {
        serde_json::Value::Null => Ok(JsonObject::new()),
        serde_json::Value::Object(map) => Ok(map.clone()),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(JsonObject::new());
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                SwarmError::decoding(
                    format!("arguments for tool {tool_name}"),
                    format!("not valid JSON: {e}"),
                )
            })?;
            match parsed {
                serde_json::Value::Object(map) => Ok(map),
                other => Err(not_an_object(tool_name, &other)),
            }
        }
        other => Err(not_an_object(tool_name, other)),
    }
}

fn not_an_object(tool_name: &str, value: &serde_json::Value) -> SwarmError {
    SwarmError::decoding(
        format!("arguments for tool {tool_name}"),
        format!("expected a JSON object, got {value}"),
    )
}
