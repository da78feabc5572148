//! Session-aware client for the interview analysis backend.
//!
//! # Architecture
//!
//! - [`CredentialStore`]: the access/refresh pair, persisted through a
//!   [`CredentialBackend`].
//! - [`SessionGateway`]: attaches the access token, performs one shared refresh on
//!   401 and retries once; ends the session when the refresh fails.
//! - [`AnalysisRepository`]: typed endpoints on top of the gateway.
//! - [`aggregation`]: dashboard statistics over a list of [`AnalysisRecord`]s.

pub mod aggregation;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod repository;
pub mod session;

pub use aggregation::AggregateSummary;
pub use config::ClientConfig;
pub use credentials::{Credential, CredentialBackend, CredentialStore, FileBackend, MemoryBackend};
pub use error::{ClientError, FieldErrors, Result};
pub use models::{
    Account, AnalysisRecord, Difficulty, LoginResponse, PauseAnalytics, ProfileRecord,
    ProfileUpdate, QuestionCategory, QuestionRecord, RegisterRequest,
};
pub use repository::{AnalysisRepository, VideoUpload};
pub use session::{
    ApiRequest, ApiResponse, HttpTransport, ProgressCallback, SessionEvent, SessionGateway,
    Transport, UploadProgress,
};
