//! Credential persistence and the process-wide credential store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::types::{Credential, StoredKeys};
use crate::error::{ClientError, Result};

/// Durable key-value storage for the credential pair.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Read the persisted keys. A missing store is an empty [`StoredKeys`].
    async fn load(&self) -> Result<StoredKeys>;

    /// Persist both keys together.
    async fn save(&self, credential: &Credential) -> Result<()>;

    /// Remove both keys together.
    async fn remove(&self) -> Result<()>;
}

/// JSON file backend.
///
/// Writes go to a sibling temp file which is then renamed over the target, so a
/// reader never sees a half-written pair.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_atomically(&self, contents: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::storage("creating directory", parent, e))?;
        }

        let temp = self.temp_path();
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&temp)
            .await
            .map_err(|e| ClientError::storage("opening", &temp, e))?;
        file.write_all(contents)
            .await
            .map_err(|e| ClientError::storage("writing", &temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| ClientError::storage("writing", &temp, e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| ClientError::storage("replacing", &self.path, e))
    }
}

#[async_trait]
impl CredentialBackend for FileBackend {
    async fn load(&self) -> Result<StoredKeys> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoredKeys::default()),
            Err(e) => return Err(ClientError::storage("reading", &self.path, e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let contents = serde_json::to_vec_pretty(&StoredKeys::from(credential))?;
        self.write_atomically(&contents).await
    }

    async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::storage("removing", &self.path, e)),
        }
    }
}

/// In-memory backend, nothing survives the process.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<Credential>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a credential, as if persisted by an earlier run.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialBackend for MemoryBackend {
    async fn load(&self) -> Result<StoredKeys> {
        Ok(self
            .slot
            .lock()
            .as_ref()
            .map(StoredKeys::from)
            .unwrap_or_default())
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        *self.slot.lock() = Some(credential.clone());
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// Process-wide holder of the current credential.
///
/// Seeded once from its backend. Only the session gateway replaces or clears the
/// credential, so a login always passes through the gateway's state machine.
///
/// The in-memory swap is synchronous and never waits on I/O. Persistence runs
/// afterwards under its own lock and always writes the latest in-memory value, so
/// the backend converges on the most recent update.
pub struct CredentialStore {
    current: RwLock<Option<Credential>>,
    persist_lock: tokio::sync::Mutex<()>,
    backend: Box<dyn CredentialBackend>,
}

impl CredentialStore {
    /// Open a store and seed it from `backend`.
    ///
    /// Unreadable or partial persisted state starts the process logged out.
    pub async fn open(backend: impl CredentialBackend + 'static) -> Self {
        let current = match backend.load().await {
            Ok(keys) if keys.is_empty() => None,
            Ok(keys) => {
                let credential = keys.into_credential();
                if credential.is_none() {
                    warn!("Persisted credential is incomplete; starting logged out");
                }
                credential
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted credential; starting logged out");
                None
            }
        };

        debug!(signed_in = current.is_some(), "Credential store opened");
        Self::with_current(current, backend)
    }

    /// Empty store backed by memory only.
    pub fn in_memory() -> Self {
        Self::with_current(None, MemoryBackend::new())
    }

    fn with_current(current: Option<Credential>, backend: impl CredentialBackend + 'static) -> Self {
        Self {
            current: RwLock::new(current),
            persist_lock: tokio::sync::Mutex::new(()),
            backend: Box::new(backend),
        }
    }

    pub fn get(&self) -> Option<Credential> {
        self.current.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|c| c.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|c| c.refresh_token.clone())
    }

    #[inline]
    pub fn is_signed_in(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the in-memory credential. Call [`persist`](Self::persist) to make
    /// it durable.
    pub(crate) fn set(&self, credential: Credential) {
        *self.current.write() = Some(credential);
    }

    /// Drop the in-memory credential.
    pub(crate) fn clear(&self) {
        *self.current.write() = None;
    }

    /// Write the current in-memory credential to the backend, or remove the
    /// persisted one when signed out.
    pub(crate) async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        match self.get() {
            Some(credential) => self.backend.save(&credential).await,
            None => self.backend.remove().await,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = CredentialStore::open(FileBackend::new(&path)).await;
        assert!(!store.is_signed_in());

        store.set(Credential::new("access-1", "refresh-1"));
        store.persist().await.unwrap();
        assert_eq!(store.access_token().as_deref(), Some("access-1"));

        let reopened = CredentialStore::open(FileBackend::new(&path)).await;
        assert_eq!(reopened.get(), Some(Credential::new("access-1", "refresh-1")));

        reopened.clear();
        reopened.persist().await.unwrap();
        assert!(reopened.get().is_none());
        assert!(!path.exists());

        let again = CredentialStore::open(FileBackend::new(&path)).await;
        assert!(!again.is_signed_in());
    }

    #[tokio::test]
    async fn test_file_uses_durable_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::open(FileBackend::new(&path)).await;
        store.set(Credential::new("a", "r"));
        store.persist().await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "a");
        assert_eq!(raw["refreshToken"], "r");
        assert!(!dir.path().join("credentials.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_partial_file_starts_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"token": "orphan"}"#).unwrap();

        let store = CredentialStore::open(FileBackend::new(&path)).await;
        assert!(store.get().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = CredentialStore::open(FileBackend::new(&path)).await;
        assert!(!store.is_signed_in());
    }

    #[tokio::test]
    async fn test_clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::open(FileBackend::new(dir.path().join("missing.json"))).await;
        assert!(store.persist().await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_backend_seeding() {
        let store =
            CredentialStore::open(MemoryBackend::with_credential(Credential::new("a", "r"))).await;
        assert_eq!(store.refresh_token().as_deref(), Some("r"));

        store.set(Credential::new("a2", "r"));
        assert_eq!(store.access_token().as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn test_persist_writes_latest_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::open(FileBackend::new(&path)).await;

        store.set(Credential::new("first", "r1"));
        store.set(Credential::new("second", "r2"));
        let (a, b) = tokio::join!(store.persist(), store.persist());
        a.unwrap();
        b.unwrap();

        let reopened = CredentialStore::open(FileBackend::new(&path)).await;
        assert_eq!(reopened.get(), Some(Credential::new("second", "r2")));
    }
}
