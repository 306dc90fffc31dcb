//! Persistence backend abstraction.
//!
//! Record stores never talk to LMDB directly. They read and write whole
//! serialized collections through [`StorageBackend`], a plain string
//! key-value contract with `get`/`set`/`remove`. The LMDB environment in
//! [`crate::local_db_state`] implements it for devices; [`MemoryBackend`]
//! implements it for tests and for hosts that manage durability themselves.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Failure reported by a persistence backend or while (de)serializing the
/// value stored under a key.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored value is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl From<lmdb::Error> for StorageError {
    fn from(err: lmdb::Error) -> Self {
        StorageError::Backend(format!("LMDB: {err}"))
    }
}

/// String key-value store used to persist record collections.
///
/// Implementations must make a single `set` durable as one unit; callers
/// perform read-modify-write cycles on top of it and accept that two
/// concurrent writers end in last-writer-wins.
pub trait StorageBackend: Send + Sync {
    /// Returns the value stored under `key`, or `None` when nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("memory backend lock poisoned".to_string()))
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
