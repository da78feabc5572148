//! Request and response values passed through the gateway.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result};

/// Upload progress of a multipart file part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Completion ratio in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.sent as f64 / self.total as f64
        }
    }
}

/// Side channel for upload progress. Not part of the request's outcome.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// A file carried by a multipart body.
#[derive(Clone)]
pub struct FilePart {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
    pub progress: Option<ProgressCallback>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, part: FilePart },
}

/// Request body.
///
/// Owned and cheaply clonable so the same request can be dispatched a second time
/// after a credential refresh.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// An outgoing API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint path relative to the API root, e.g. `/analyses/3/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Attach the access token and take part in the refresh protocol.
    pub auth_required: bool,
    /// Overrides the transport's default timeout.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            auth_required: true,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Mark the request as public: no token, no refresh on 401.
    pub fn without_auth(mut self) -> Self {
        self.auth_required = false;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A received response, body fully buffered.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[inline]
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Turn a non-2xx response into the matching [`ClientError`].
    pub fn error_for_status(self, resource: &str) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ClientError::from_status(self.status, &self.body, resource))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_require_auth_by_default() {
        let request = ApiRequest::get("/analyses/");
        assert!(request.auth_required);
        assert!(!ApiRequest::post("/login/").without_auth().auth_required);
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::post("/login/")
            .json(&serde_json::json!({"email": "a@b.c"}))
            .unwrap();
        match request.body {
            RequestBody::Json(value) => assert_eq!(value["email"], "a@b.c"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status() {
        let ok = ApiResponse::new(StatusCode::CREATED, "{}");
        assert!(ok.error_for_status("/analyze/").is_ok());

        let missing = ApiResponse::new(StatusCode::NOT_FOUND, "");
        assert!(matches!(
            missing.error_for_status("/analyses/4/"),
            Err(ClientError::NotFound { .. })
        ));
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(UploadProgress { sent: 5, total: 10 }.fraction(), 0.5);
        assert_eq!(UploadProgress { sent: 0, total: 0 }.fraction(), 1.0);
    }
}
