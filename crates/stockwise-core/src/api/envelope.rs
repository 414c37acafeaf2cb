//! Response envelope handling.
//!
//! The backend answers in one of three shapes: a bare array, an
//! `{ok: true, data}` envelope, or an `{ok: false, error, code}` rejection.
//! Every call funnels through [`normalize`] so callers only ever see the
//! payload or an [`ApiError`].

use reqwest::StatusCode;
use serde_json::Value;

use super::ApiError;

/// Parse a response body, treating empty or malformed input as no payload.
pub fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

/// Turn a status and parsed body into the payload the caller asked for.
///
/// Failure statuses never look at the envelope; the HTTP status governs.
pub fn normalize(status: StatusCode, body: Option<Value>) -> Result<Value, ApiError> {
    if !status.is_success() {
        return Err(ApiError::from_parts(status, body.as_ref()));
    }

    match body {
        None => Ok(Value::Null),
        Some(Value::Array(items)) => Ok(Value::Array(items)),
        Some(Value::Object(mut map)) => {
            let enveloped = map.get("ok").map(is_truthy).unwrap_or(false) && map.contains_key("data");
            if enveloped {
                Ok(map.remove("data").unwrap_or(Value::Null))
            } else {
                Ok(Value::Object(map))
            }
        }
        Some(other) => Ok(other),
    }
}

/// JavaScript-style truthiness, which is what the backend's clients assume.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
