use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Maximum length for raw response bodies quoted in log lines
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// A request the backend answered with a non-success status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// Build an error from the status and the (possibly absent) parsed body.
    ///
    /// The message prefers the body's `error` field, then `message`, and
    /// falls back to the status line (e.g. `500 Internal Server Error`).
    pub fn from_parts(status: StatusCode, body: Option<&Value>) -> Self {
        let message = body
            .and_then(|b| text_field(b, "error").or_else(|| text_field(b, "message")))
            .unwrap_or_else(|| status_line(status));
        let code = body
            .and_then(|b| b.get("code"))
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Self {
            status: status.as_u16(),
            message,
            code,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }

    pub fn is_validation(&self) -> bool {
        self.status == 400 || self.code.as_deref() == Some("VALIDATION_ERROR")
    }

    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.status)
    }
}

/// Everything a call through [`crate::api::ApiClient`] can fail with.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session expired - redirected to {redirected_to}")]
    SessionExpired { redirected_to: String },

    #[error("Unexpected payload shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Could not serialize request body: {0}")]
    Encode(serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Session storage error: {0}")]
    Storage(anyhow::Error),
}

impl ClientError {
    /// Transport failure or timeout. Usually worth retrying.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Network(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }

    /// The failure was already dealt with (navigation to the login route
    /// happened), so the caller should not surface it again.
    pub fn is_handled(&self) -> bool {
        matches!(self, ClientError::SessionExpired { .. })
    }

    /// The backend rejection, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.api().map(|e| e.status)
    }
}

/// Non-empty string value of `key`, or the JSON text of any other truthy value.
fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

pub(crate) fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Truncate a response body to avoid logging excessive data
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}
