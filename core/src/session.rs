//! Session context holding the bearer token.
//!
//! # Design
//! The token is the only durable client-side state. `Session` owns it
//! behind a lock and is the single place that reads or writes the backing
//! [`SessionStore`]. The HTTP client only ever calls [`Session::token`];
//! login and logout flows call `set_token` and `clear`.
//!
//! A blank token is treated the same as no token.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Persistence backend for the session token.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn save(&self, token: &str) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.lock() = None;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// JSON file with a single `token` key.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_str(&raw)?;
        Ok(stored.token)
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            token: Some(token.to_string()),
        };
        fs::write(&self.path, serde_json::to_string(&stored)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The session context shared by the client and the pages.
pub struct Session {
    token: RwLock<Option<String>>,
    store: Box<dyn SessionStore>,
}

impl Session {
    /// Reads the persisted token once; later reads hit the cached value.
    pub fn load(store: impl SessionStore + 'static) -> Result<Self, SessionError> {
        let token = store.load()?.filter(|t| !t.trim().is_empty());
        tracing::debug!(authenticated = token.is_some(), "session loaded");
        Ok(Self {
            token: RwLock::new(token),
            store: Box::new(store),
        })
    }

    /// An empty in-memory session.
    pub fn anonymous() -> Self {
        Self {
            token: RwLock::new(None),
            store: Box::new(MemoryStore::default()),
        }
    }

    /// An in-memory session already holding `token`.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string()).filter(|t| !t.trim().is_empty())),
            store: Box::new(MemoryStore::with_token(token)),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn set_token(&self, token: &str) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return self.clear();
        }
        self.store.save(token)?;
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        *self.token.write() = None;
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
