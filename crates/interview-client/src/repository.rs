//! Typed access to the analysis backend.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::models::{
    Account, AnalysisRecord, LoginResponse, ProfileRecord, ProfileUpdate, QuestionRecord,
    RegisterRequest,
};
use crate::models::account::LoginRequest;
use crate::session::{
    ApiRequest, FilePart, FormField, HttpTransport, ProgressCallback, SessionGateway,
};

const REGISTER_PATH: &str = "/register/";
const LOGIN_PATH: &str = "/login/";
const ANALYZE_PATH: &str = "/analyze/";
const ANALYSES_PATH: &str = "/analyses/";
const PROFILE_PATH: &str = "/profile/";
const QUESTION_SEARCH_PATH: &str = "/interview-questions/search/";

/// A video to submit for analysis.
#[derive(Clone)]
pub struct VideoUpload {
    pub file_name: String,
    pub bytes: Bytes,
    pub candidate_name: String,
    pub progress: Option<ProgressCallback>,
}

impl VideoUpload {
    pub fn new(
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
        candidate_name: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            candidate_name: candidate_name.into(),
            progress: None,
        }
    }

    /// Report upload progress to `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn into_fields(self) -> Vec<FormField> {
        let mime = video_mime(&self.file_name).to_string();
        vec![
            FormField::File {
                name: "video".into(),
                part: FilePart {
                    file_name: self.file_name,
                    mime,
                    bytes: self.bytes,
                    progress: self.progress,
                },
            },
            FormField::Text {
                name: "candidate_name".into(),
                value: self.candidate_name,
            },
        ]
    }
}

/// Guess the container type from the file extension.
fn video_mime(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Analysis, account and question endpoints over a [`SessionGateway`].
///
/// Every call except [`register`](Self::register) and [`login`](Self::login)
/// carries the session's access token.
#[derive(Clone)]
pub struct AnalysisRepository {
    gateway: SessionGateway,
    upload_timeout: Duration,
}

impl AnalysisRepository {
    pub fn new(gateway: SessionGateway) -> Self {
        Self {
            gateway,
            upload_timeout: ClientConfig::default().upload_timeout,
        }
    }

    /// Build the HTTP stack for `config` on top of `store`.
    pub fn connect(config: ClientConfig, store: Arc<CredentialStore>) -> Result<Self> {
        let upload_timeout = config.upload_timeout;
        let transport = HttpTransport::new(config)?;
        let gateway = SessionGateway::new(Arc::new(transport), store);
        Ok(Self::new(gateway).with_upload_timeout(upload_timeout))
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn gateway(&self) -> &SessionGateway {
        &self.gateway
    }

    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<Account> {
        let account: Account = self
            .gateway
            .send_json(ApiRequest::post(REGISTER_PATH).without_auth().json(request)?)
            .await?;
        info!(id = account.id, "Account registered");
        Ok(account)
    }

    /// Exchange email and password for a credential.
    ///
    /// The credential is returned, not installed; pass it to
    /// [`SessionGateway::begin_session`] or use [`sign_in`](Self::sign_in).
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let request = ApiRequest::post(LOGIN_PATH)
            .without_auth()
            .json(&LoginRequest { email, password })?;
        self.gateway.send_json(request).await
    }

    /// [`login`](Self::login) and start the session with the returned credential.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let response = self.login(email, password).await?;
        self.gateway.begin_session(response.credential()).await?;
        Ok(response)
    }

    /// Drop the local credential. The backend keeps no session to end.
    pub async fn logout(&self) -> Result<()> {
        self.gateway.end_session().await
    }

    /// Upload a video and wait for its analysis.
    #[instrument(skip_all, fields(file = %upload.file_name, size = upload.bytes.len()))]
    pub async fn submit_analysis(&self, upload: VideoUpload) -> Result<AnalysisRecord> {
        let request = ApiRequest::post(ANALYZE_PATH)
            .multipart(upload.into_fields())
            .timeout(self.upload_timeout);
        let record: AnalysisRecord = self.gateway.send_json(request).await?;
        info!(id = record.id, score = record.interview_score, "Analysis created");
        Ok(record)
    }

    /// All analyses of the signed-in user, in backend order.
    #[instrument(skip_all)]
    pub async fn list_analyses(&self) -> Result<Vec<AnalysisRecord>> {
        let records: Vec<AnalysisRecord> =
            self.gateway.send_json(ApiRequest::get(ANALYSES_PATH)).await?;
        debug!(count = records.len(), "Analyses listed");
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn get_analysis(&self, id: i64) -> Result<AnalysisRecord> {
        self.gateway
            .send_json(ApiRequest::get(format!("{ANALYSES_PATH}{id}/")))
            .await
    }

    #[instrument(skip_all)]
    pub async fn get_profile(&self) -> Result<ProfileRecord> {
        self.gateway.send_json(ApiRequest::get(PROFILE_PATH)).await
    }

    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileRecord> {
        self.gateway
            .send_json(ApiRequest::put(PROFILE_PATH).json(update)?)
            .await
    }

    /// Search practice questions. A blank query yields nothing without a request.
    #[instrument(skip(self))]
    pub async fn search_questions(&self, query: &str) -> Result<Vec<QuestionRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let questions: Vec<QuestionRecord> = self
            .gateway
            .send_json(ApiRequest::get(QUESTION_SEARCH_PATH).query("query", query))
            .await?;
        debug!(count = questions.len(), "Questions found");
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_mime() {
        assert_eq!(video_mime("interview.MP4"), "video/mp4");
        assert_eq!(video_mime("take-2.webm"), "video/webm");
        assert_eq!(video_mime("clip.mov"), "video/quicktime");
        assert_eq!(video_mime("recording"), "application/octet-stream");
    }

    #[test]
    fn test_upload_fields() {
        let fields = VideoUpload::new("a.mp4", vec![1u8, 2, 3], "Ada").into_fields();
        assert_eq!(fields.len(), 2);

        match &fields[0] {
            FormField::File { name, part } => {
                assert_eq!(name, "video");
                assert_eq!(part.mime, "video/mp4");
                assert_eq!(part.bytes.len(), 3);
            }
            other => panic!("unexpected field: {other:?}"),
        }
        match &fields[1] {
            FormField::Text { name, value } => {
                assert_eq!(name, "candidate_name");
                assert_eq!(value, "Ada");
            }
            other => panic!("unexpected field: {other:?}"),
        }
    }
}
