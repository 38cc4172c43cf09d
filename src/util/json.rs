//! Lenient JSON extraction from model replies.

use serde::de::DeserializeOwned;

use crate::error::SwarmError;

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string ("json", "JSON", ...) on the opening line.
    let body = match body.split_once('\n') {
        Some((info, rest)) if !info.trim_start().starts_with('{') => rest,
        _ => body.trim_start_matches("json"),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// Parse a model or peer reply as `T`, tolerating code fences.
pub fn parse_reply<T: DeserializeOwned>(context: &str, text: &str) -> Result<T, SwarmError> {
    serde_json::from_str(&strip_code_fences(text)).map_err(|e| SwarmError::decoding(context, e))
}
