//! Recovery of JSON objects from free-form model output.
//!
//! Models reliably produce JSON but not reliably *only* JSON: replies come
//! wrapped in prose or markdown fences. The recovery heuristic takes the
//! substring from the first `{` to the last `}` and decodes it. Any failure
//! yields `None`; nothing here returns an error to the caller.

use serde::de::DeserializeOwned;
use tracing::debug;

/// Slice out the candidate JSON object, braces included.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let first = raw.find('{')?;
    let last = raw.rfind('}')?;
    if last <= first {
        return None;
    }
    Some(&raw[first..=last])
}

/// Extract and decode a JSON object of type `T` from raw model text.
pub fn sanitize<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if raw.trim().is_empty() {
        return None;
    }

    let candidate = match extract_json_object(raw) {
        Some(c) => c,
        None => {
            debug!("No JSON object found in model output ({} chars)", raw.len());
            return None;
        }
    };

    match serde_json::from_str::<T>(candidate) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Failed to decode model output: {}", e);
            None
        }
    }
}
