//! Persisted client storage for the session keys.
//!
//! DESIGN
//! ======
//! The dashboard keeps two keys in browser local storage: the bearer token
//! and a JSON snapshot of the profile. `SessionStorage` is the same
//! string key/value contract; `FileStorage` keeps one file per key so a CLI
//! session survives between invocations, `MemoryStorage` backs tests.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "careconnect_token";
/// Storage key holding the serialized profile snapshot.
pub const USER_KEY: &str = "careconnect_user";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("value could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key/value store. Implementations must be usable from several
/// tasks at once; each call is atomic on its own key.
pub trait SessionStorage: Send + Sync {
    /// Read a key. Missing keys are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// One file per key under `dir`. The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(key))
    }
}

pub(crate) fn valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io { key: key.to_owned(), source }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;

        // Write-then-rename so a crash never leaves a half-written token.
        let tmp = self.dir.join(format!(".{key}.tmp"));
        std::fs::write(&tmp, value).map_err(|e| io_error(key, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error(key, e))?;
        tracing::debug!(key, dir = %self.dir.display(), "storage key written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
