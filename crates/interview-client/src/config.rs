use std::time::Duration;

use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

pub const DEFAULT_USER_AGENT: &str = concat!("interview-client/", env!("CARGO_PKG_VERSION"));

/// Configurable options for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, every endpoint path is appended to it
    pub base_url: Url,

    /// Overall timeout for ordinary requests
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Overall timeout for video uploads.
    ///
    /// The backend transcribes and scores the video before answering, so this is
    /// much longer than `timeout`.
    pub upload_timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(600),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at `base_url`, other options default.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::default().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| ClientError::config(format!("invalid base url `{base_url}`: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "unsupported scheme `{}` in base url",
                url.scheme()
            )));
        }

        self.base_url = url;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Resolve an endpoint path (e.g. `/analyses/3/`) against the base url.
    ///
    /// `Url::join` would drop the base path for absolute paths, so the two are
    /// concatenated instead.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ClientError::config(format!("invalid endpoint `{path}`: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint("/analyses/12/").unwrap().as_str(),
            "http://localhost:8000/api/analyses/12/"
        );

        let config = ClientConfig::new("https://example.com/api/").unwrap();
        assert_eq!(
            config.endpoint("token/refresh/").unwrap().as_str(),
            "https://example.com/api/token/refresh/"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(matches!(
            ClientConfig::new("ftp://example.com"),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_upload_timeout(Duration::from_secs(60))
            .with_user_agent("insight-test");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.upload_timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "insight-test");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
