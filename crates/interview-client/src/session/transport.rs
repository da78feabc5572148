//! HTTP transport.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tracing::{debug, warn};

use super::request::{ApiRequest, ApiResponse, FilePart, FormField, RequestBody, UploadProgress};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Size of the chunks a file part is streamed in when progress is reported.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Sends one request and returns whatever the backend answered.
///
/// Implementations must not interpret status codes: a 401 is a successful
/// dispatch. Only a missing response is an error (`ClientError::Transport`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse>;
}

/// [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout);

        // Per-request timeouts take precedence; this is only the fallback.
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Wrap an existing client, e.g. one with custom TLS or proxy settings.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_form(fields: &[FormField]) -> Result<Form> {
        let mut form = Form::new();
        for field in fields {
            form = match field {
                FormField::Text { name, value } => form.text(name.clone(), value.clone()),
                FormField::File { name, part } => form.part(name.clone(), Self::file_part(part)?),
            };
        }
        Ok(form)
    }

    fn file_part(file: &FilePart) -> Result<Part> {
        let total = file.bytes.len() as u64;

        let body = match file.progress.clone() {
            None => Body::from(file.bytes.clone()),
            Some(progress) => {
                let bytes = file.bytes.clone();
                let chunks: Vec<Bytes> = (0..bytes.len())
                    .step_by(UPLOAD_CHUNK_SIZE)
                    .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
                    .collect();

                progress(UploadProgress { sent: 0, total });
                let mut sent = 0u64;
                let stream = futures::stream::iter(chunks).map(move |chunk| {
                    sent += chunk.len() as u64;
                    progress(UploadProgress { sent, total });
                    Ok::<Bytes, std::io::Error>(chunk)
                });
                Body::wrap_stream(stream)
            }
        };

        let part = Part::stream_with_length(body, total)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|e| ClientError::config(format!("invalid mime type `{}`: {e}", file.mime)))?;
        Ok(part)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse> {
        let url = self.config.endpoint(&request.path)?;
        let mut builder = self.client.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(Self::build_form(fields)?),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %request.method, path = %request.path, error = %e, "Request did not complete");
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.bytes().await?;
        debug!(method = %request.method, path = %request.path, %status, len = body.len(), "Response received");

        Ok(ApiResponse { status, body })
    }
}
