//! Client-side persistence of the credential bundle.
//!
//! Every store degrades instead of failing: reads of an unavailable or
//! corrupt medium return `None`, and writes/clears that hit an I/O error are
//! logged and dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::model::{CredentialBundle, epoch_millis, from_epoch_millis};

const SESSION_FILE: &str = "session.json";

pub trait TokenStore: Send + Sync {
    /// Returns the stored bundle, or `None` if nothing usable is stored.
    fn read(&self) -> Option<CredentialBundle>;

    /// Replaces the stored bundle as one unit.
    fn write(&self, bundle: &CredentialBundle);

    /// Removes the stored bundle. Idempotent.
    fn clear(&self);
}

/// On-disk layout: the four keys, all strings, `expires_at` in epoch millis.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    access_token: String,

    #[serde(default)]
    id_token: String,

    #[serde(default)]
    refresh_token: String,

    #[serde(default)]
    expires_at: String,
}

impl StoredSession {
    fn from_bundle(bundle: &CredentialBundle) -> Self {
        Self {
            access_token: bundle.access_token.clone(),
            id_token: bundle.id_token.clone().unwrap_or_default(),
            refresh_token: bundle.refresh_token.clone(),
            expires_at: epoch_millis(bundle.expires_at).to_string(),
        }
    }

    fn into_bundle(self) -> Option<CredentialBundle> {
        // Without a refresh token the rest of the entry means nothing.
        if self.refresh_token.is_empty() || self.access_token.is_empty() {
            return None;
        }
        let ms: i64 = self.expires_at.trim().parse().ok()?;
        Some(CredentialBundle {
            access_token: self.access_token,
            id_token: Some(self.id_token).filter(|s| !s.is_empty()),
            refresh_token: self.refresh_token,
            expires_at: from_epoch_millis(ms)?,
        })
    }
}

/// Keeps the session in `<dir>/session.json`, replaced by rename so readers
/// never observe a half-written bundle.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(SESSION_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_read(&self) -> io::Result<Option<CredentialBundle>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let stored: StoredSession = serde_json::from_slice(&bytes)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(stored.into_bundle())
    }

    fn try_clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Option<CredentialBundle> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.try_read() {
            Ok(bundle) => bundle,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "unreadable session file");
                None
            }
        }
    }

    fn write(&self, bundle: &CredentialBundle) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let result = serde_json::to_vec_pretty(&StoredSession::from_bundle(bundle))
            .map_err(io::Error::other)
            .and_then(|bytes| write_atomic(&self.path, &bytes));
        if let Err(err) = result {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to persist session");
        }
    }

    fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = self.try_clear() {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to clear session");
        }
    }
}

/// Process-local store, for tests and embedding.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<CredentialBundle>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(bundle: CredentialBundle) -> Self {
        Self {
            inner: Mutex::new(Some(bundle)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Option<CredentialBundle> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn write(&self, bundle: &CredentialBundle) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(bundle.clone());
    }

    fn clear(&self) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Medium for contexts with no client storage: always empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableTokenStore;

impl TokenStore for UnavailableTokenStore {
    fn read(&self) -> Option<CredentialBundle> {
        None
    }

    fn write(&self, _bundle: &CredentialBundle) {}

    fn clear(&self) {}
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
