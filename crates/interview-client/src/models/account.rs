use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::credentials::Credential;

/// A backend user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

impl Account {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Body of `POST /register/`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /login/`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Answer of `POST /login/`.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<Account>,
}

impl LoginResponse {
    pub fn credential(&self) -> Credential {
        Credential::new(self.access.clone(), self.refresh.clone())
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// One entry of the profile's recent interview history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSummary {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub interview_score: f64,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub notifications: bool,
    #[serde(default)]
    pub email_updates: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub language: String,
}

/// Account plus interview statistics, as returned by `GET /profile/`.
///
/// `PUT /profile/` answers with the account fields only, so every statistic is
/// optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(flatten)]
    pub account: Account,
    #[serde(default)]
    pub interviews_completed: Option<u64>,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub last_interview: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interview_history: Vec<InterviewSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// Partial profile update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.username.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_profile_with_stats() {
        let profile: ProfileRecord = serde_json::from_str(
            r#"{
                "id": 3, "username": "ada", "email": "ada@example.com",
                "first_name": "Ada", "last_name": "Lovelace",
                "date_joined": "2025-01-01T00:00:00Z",
                "interviewsCompleted": 2,
                "averageScore": 0.75,
                "lastInterview": "2025-02-01T12:00:00Z",
                "interviewHistory": [
                    {"date": "2025-02-01T12:00:00Z", "score": 0.8, "role": "Ada",
                     "interview_score": 0.8, "sentiment_score": null}
                ],
                "skills": [],
                "preferences": {"notifications": true, "emailUpdates": true, "darkMode": false, "language": "English"}
            }"#,
        )
        .unwrap();

        assert_eq!(profile.account.display_name(), "Ada Lovelace");
        assert_eq!(profile.interviews_completed, Some(2));
        assert_eq!(profile.interview_history.len(), 1);
        assert!(profile.interview_history[0].sentiment_score.is_none());
        assert_eq!(profile.preferences.unwrap().language, "English");
    }

    #[test]
    fn test_decode_profile_update_answer() {
        let profile: ProfileRecord = serde_json::from_str(
            r#"{"id": 3, "username": "ada", "email": "", "first_name": "", "last_name": "", "date_joined": "2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(profile.interviews_completed.is_none());
        assert!(profile.interview_history.is_empty());
        assert_eq!(profile.account.display_name(), "ada");
    }

    #[test]
    fn test_profile_update_sends_only_set_fields() {
        let update = ProfileUpdate {
            first_name: Some("Grace".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"first_name": "Grace"})
        );
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_register_request_hides_password() {
        let request = RegisterRequest::new("ada", "ada@example.com", "hunter2");
        assert!(!format!("{request:?}").contains("hunter2"));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["password"], "hunter2");
        assert!(json.get("first_name").is_none());
    }

    #[test]
    fn test_login_response_credential() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"access": "a1", "refresh": "r1"}"#).unwrap();
        let credential = response.credential();
        assert_eq!(credential.access_token, "a1");
        assert_eq!(credential.refresh_token, "r1");
        assert!(response.user.is_none());
    }
}
