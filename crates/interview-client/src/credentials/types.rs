//! Credential types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Durable key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Durable key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Access/refresh token pair identifying an authenticated session.
///
/// Both tokens are always present; a partially known pair is represented as
/// "no credential".
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Replace the access token, keeping the refresh token unless a rotated one is given.
    pub fn refreshed(&self, access_token: String, rotated_refresh: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token: rotated_refresh.unwrap_or_else(|| self.refresh_token.clone()),
        }
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// On-disk shape of the persisted pair.
///
/// Either key may be missing in a damaged file; [`StoredKeys::into_credential`]
/// only yields a credential when both are present.
#[derive(Default, Serialize, Deserialize)]
pub struct StoredKeys {
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredKeys {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.refresh_token.is_none()
    }

    pub fn into_credential(self) -> Option<Credential> {
        match (self.token, self.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(Credential::new(access, refresh))
            }
            _ => None,
        }
    }
}

impl From<&Credential> for StoredKeys {
    fn from(credential: &Credential) -> Self {
        Self {
            token: Some(credential.access_token.clone()),
            refresh_token: Some(credential.refresh_token.clone()),
        }
    }
}
