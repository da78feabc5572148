//! Client error types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Result type used throughout the client.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Field name used by the backend for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Errors surfaced at the repository boundary.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connect error, reset, timeout).
    #[error("transport failure: {reason}")]
    Transport { reason: String, timed_out: bool },

    /// The backend answered 401 and the request is not eligible for (another) refresh.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The refresh protocol failed; the session is over until the next login.
    #[error("session expired: {reason}")]
    SessionExpired { reason: String },

    /// The requested resource does not exist.
    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    /// The backend rejected the input.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Any other non-2xx answer.
    #[error("request failed with HTTP {status}: {message}")]
    RequestFailed { status: StatusCode, message: String },

    /// A 2xx body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Credential persistence failed.
    #[error("{op} {path}: {reason}")]
    Storage {
        op: &'static str,
        path: String,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    pub fn session_expired(reason: impl Into<String>) -> Self {
        Self::SessionExpired {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn storage(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Storage {
            op,
            path: path.display().to_string(),
            reason: source.to_string(),
        }
    }

    /// Check if this error means the user has to log in again.
    pub fn requires_relogin(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Check if this error is transient and the caller may try again later.
    ///
    /// The gateway itself never retries these.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Build the error for a non-2xx response.
    pub(crate) fn from_status(status: StatusCode, body: &[u8], resource: &str) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::Validation(FieldErrors::from_body(body)),
            StatusCode::UNAUTHORIZED => Self::Unauthorized {
                message: message_from_body(body).unwrap_or_else(|| "authentication required".into()),
            },
            StatusCode::NOT_FOUND => Self::not_found(resource),
            _ => Self::RequestFailed {
                status,
                message: message_from_body(body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            timed_out: err.is_timeout(),
            reason: err.to_string(),
        }
    }
}

/// Pull a human readable message out of an error body.
///
/// The backend answers either `{"error": ...}` or `{"detail": ...}`; anything else
/// is returned as (trimmed) text.
fn message_from_body(body: &[u8]) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return Some(msg.clone());
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.chars().take(200).collect())
    }
}

/// Per-field validation messages, as returned by the backend on HTTP 400.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Parse a 400 body.
    ///
    /// Object bodies map each field to its message list (a bare string becomes a
    /// single message). Anything else is filed under [`NON_FIELD_ERRORS`].
    pub fn from_body(body: &[u8]) -> Self {
        let mut fields = BTreeMap::new();

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => {
                for (field, value) in map {
                    fields.insert(field, messages(value));
                }
            }
            Ok(value) => {
                fields.insert(NON_FIELD_ERRORS.to_string(), messages(value));
            }
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if !text.is_empty() {
                    fields.insert(NON_FIELD_ERRORS.to_string(), vec![text]);
                }
            }
        }

        Self(fields)
    }

    /// Messages for one field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn messages(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) => vec![s],
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("invalid input");
        }

        for (i, (field, msgs)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}: {}", field, msgs.join(", "))?;
        }
        Ok(())
    }
}
