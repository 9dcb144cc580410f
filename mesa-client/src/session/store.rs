//! 会话持久化 - token 与 user 存在同一条记录里
//!
//! One canonical record holds both the token and the user, so the pair is
//! committed and cleared together and a reader can never observe one
//! without the other.

use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::Session;

/// Durable storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record exists but cannot be trusted; callers purge it
    #[error("Corrupt session record: {0}")]
    Corrupt(String),
}

fn decode(raw: &str) -> Result<Session, StoreError> {
    let record: Session =
        serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    if record.token.trim().is_empty() {
        return Err(StoreError::Corrupt("empty token".into()));
    }
    Ok(record)
}

fn encode(session: &Session) -> Result<String, StoreError> {
    serde_json::to_string_pretty(session).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Durable client-side session storage
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when nothing is stored, `Err(Corrupt)` for unreadable records
    fn load(&self) -> Result<Option<Session>, StoreError>;

    /// Commit token and user as one write
    fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Remove the record; clearing an empty store is not an error
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file store
///
/// Writes go to a sibling temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
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
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        decode(&raw).map(Some)
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, encode(session)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        let tmp = self.temp_path();
        if tmp.exists() {
            fs::remove_file(&tmp)?;
        }
        Ok(())
    }
}

/// In-memory store holding the serialized record, for tests and embedded use
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    raw: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw contents (possibly malformed)
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        match self.raw.lock().as_deref() {
            Some(raw) => decode(raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let encoded = encode(session)?;
        *self.raw.lock() = Some(encoded);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.raw.lock() = None;
        Ok(())
    }
}
