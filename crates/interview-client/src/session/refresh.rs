//! Refresh protocol state.

use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Endpoint exchanging a refresh token for a new access token.
pub const TOKEN_REFRESH_PATH: &str = "/token/refresh/";

/// Why a refresh did not produce a new access token.
///
/// Clonable so every caller attached to the same in-flight refresh gets a copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    #[error("no refresh token stored - sign in required")]
    MissingRefreshToken,

    #[error("refresh token rejected (HTTP {status})")]
    Rejected { status: u16 },

    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error("malformed refresh response: {0}")]
    Malformed(String),

    #[error("session was replaced while refreshing")]
    SessionReset,
}

/// Outcome shared by every caller attached to one refresh: the new access token.
pub(crate) type RefreshOutcome = Result<String, RefreshFailure>;

/// Handle to the in-flight refresh.
pub(crate) type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// State machine guarding the refresh endpoint.
///
/// - `Idle`: no refresh running; a 401 starts one.
/// - `Refreshing`: one refresh in flight; later 401s await the same handle.
/// - `Failed`: the last refresh failed; the session is over until the next login.
pub(crate) enum RefreshState {
    Idle,
    Refreshing(PendingRefresh),
    Failed,
}

impl RefreshState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Refreshing(_) => "refreshing",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenRefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenRefreshResponse {
    pub access: String,
    /// Present when the backend rotates refresh tokens.
    #[serde(default)]
    pub refresh: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_response_without_rotation() {
        let body: TokenRefreshResponse = serde_json::from_str(r#"{"access": "a2"}"#).unwrap();
        assert_eq!(body.access, "a2");
        assert!(body.refresh.is_none());

        let body: TokenRefreshResponse =
            serde_json::from_str(r#"{"access": "a3", "refresh": "r2"}"#).unwrap();
        assert_eq!(body.refresh.as_deref(), Some("r2"));
    }

    #[test]
    fn test_refresh_request_shape() {
        let json = serde_json::to_value(TokenRefreshRequest { refresh: "r1" }).unwrap();
        assert_eq!(json, serde_json::json!({"refresh": "r1"}));
    }
}
