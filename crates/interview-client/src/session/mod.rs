//! Authenticated request pipeline.
//!
//! # Architecture
//!
//! - [`ApiRequest`] / [`ApiResponse`]: Owned request and buffered response values
//! - [`Transport`]: Sends one request; [`HttpTransport`] is the `reqwest` implementation
//! - [`SessionGateway`]: Token injection, single-flight refresh, one retry, expiry
//! - [`SessionEvent`]: Lifecycle notifications for collaborators

mod events;
mod gateway;
mod refresh;
mod request;
mod transport;

pub use events::SessionEvent;
pub use gateway::SessionGateway;
pub use refresh::{RefreshFailure, TOKEN_REFRESH_PATH};
pub use request::{
    ApiRequest, ApiResponse, FilePart, FormField, ProgressCallback, RequestBody, UploadProgress,
};
pub use transport::{HttpTransport, Transport};
