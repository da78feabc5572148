use std::path::{Path, PathBuf};
use std::time::Duration;

use interview_client::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const APP_DIR: &str = "insight";

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API root
    pub base_url: String,
    /// Timeout for ordinary requests, in seconds
    pub timeout_secs: u64,
    /// Timeout for video uploads, in seconds
    pub upload_timeout_secs: u64,
    /// Where the session credential is kept
    pub credentials_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url.to_string(),
            timeout_secs: client.timeout.as_secs(),
            upload_timeout_secs: client.upload_timeout.as_secs(),
            credentials_path: None,
        }
    }
}

impl AppConfig {
    /// Load `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| CliError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Client settings, `base_url` overriding the configured one.
    pub fn client_config(&self, base_url: Option<&str>) -> Result<ClientConfig, CliError> {
        let base_url = base_url.unwrap_or(&self.base_url);
        let config = ClientConfig::new(base_url)?
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_upload_timeout(Duration::from_secs(self.upload_timeout_secs))
            .with_user_agent(concat!("insight/", env!("CARGO_PKG_VERSION")));
        Ok(config)
    }

    pub fn credentials_file(&self) -> Result<PathBuf, CliError> {
        if let Some(path) = &self.credentials_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join("credentials.json"))
            .ok_or_else(|| {
                CliError::Config(
                    "could not determine a data directory, set `credentials_path`".to_string(),
                )
            })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"https://insight.example.com/api\"\ncredentials_path = \"/tmp/creds.json\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "https://insight.example.com/api");
        assert_eq!(config.upload_timeout_secs, 600);
        assert_eq!(
            config.credentials_file().unwrap(),
            PathBuf::from("/tmp/creds.json")
        );
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"").unwrap();

        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_base_url_override() {
        let config = AppConfig::default();
        let client = config
            .client_config(Some("http://10.0.0.2:9000/api"))
            .unwrap();
        assert_eq!(
            client.endpoint("/analyses/").unwrap().as_str(),
            "http://10.0.0.2:9000/api/analyses/"
        );

        assert!(config.client_config(Some("not a url")).is_err());
    }
}
