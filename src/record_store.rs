//! Bounded, deduplicated, most-recent-first record collections.
//!
//! A [`RecordStore`] keeps one ordered collection under one storage key. Every
//! public operation is a full read-modify-write of that collection: read the
//! JSON array, compute the new array, write it back in one `set`. There is no
//! locking, so two writers on the same key end in last-writer-wins.
//!
//! Storage failures never escape a store. They are logged and degrade to an
//! empty list (or `false` for [`RecordStore::clear`]), which callers read as
//! "this operation had no durable effect".

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::local_db_model::{identity_key_of, BookRecord};
use crate::storage::{StorageBackend, StorageError};

pub const HISTORY_KEY: &str = "booklens_history";
pub const FAVORITES_KEY: &str = "booklens_favorites";
pub const MAX_HISTORY: usize = 50;

/// Which timestamp a store writes on upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    ScannedAt,
    SavedAt,
}

/// A record that can live in a [`RecordStore`].
pub trait StoredRecord: Clone + Serialize + DeserializeOwned {
    fn identity_key(&self) -> String;
    fn id(&self) -> i64;
    /// Overwrites the store-owned fields.
    fn stamp(&mut self, id: i64, at: DateTime<Utc>, field: TimestampField);
}

impl StoredRecord for BookRecord {
    fn identity_key(&self) -> String {
        BookRecord::identity_key(self)
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn stamp(&mut self, id: i64, at: DateTime<Utc>, field: TimestampField) {
        self.id = id;
        match field {
            TimestampField::ScannedAt => self.scanned_at = Some(at),
            TimestampField::SavedAt => self.saved_at = Some(at),
        }
    }
}

/// Selects the record a removal targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    /// Exact store-assigned id.
    Id(i64),
    /// Title, matched case-insensitively.
    Title(String),
}

impl RecordRef {
    fn matches<R: StoredRecord>(&self, record: &R) -> bool {
        match self {
            RecordRef::Id(id) => record.id() == *id,
            RecordRef::Title(title) => record.identity_key() == identity_key_of(title),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub storage_key: String,
    pub capacity: Option<usize>,
    pub timestamp_field: TimestampField,
}

impl StoreConfig {
    pub fn history() -> Self {
        Self {
            storage_key: HISTORY_KEY.to_string(),
            capacity: Some(MAX_HISTORY),
            timestamp_field: TimestampField::ScannedAt,
        }
    }

    pub fn favorites() -> Self {
        Self {
            storage_key: FAVORITES_KEY.to_string(),
            capacity: None,
            timestamp_field: TimestampField::SavedAt,
        }
    }
}

pub struct RecordStore<R> {
    backend: Arc<dyn StorageBackend>,
    config: StoreConfig,
    _record: PhantomData<R>,
}

impl<R: StoredRecord> RecordStore<R> {
    pub fn new(backend: Arc<dyn StorageBackend>, config: StoreConfig) -> Self {
        Self {
            backend,
            config,
            _record: PhantomData,
        }
    }

    /// Inserts `candidate` at the front, replacing any record with the same
    /// identity key and evicting tail entries beyond capacity.
    pub fn upsert(&self, candidate: R) -> Vec<R> {
        match self.try_upsert(candidate) {
            Ok(records) => records,
            Err(e) => {
                warn!("Error saving to '{}': {e}", self.config.storage_key);
                Vec::new()
            }
        }
    }

    /// Current collection, newest first. Unreadable state reads as empty.
    pub fn list(&self) -> Vec<R> {
        match self.load() {
            Ok(records) => records,
            Err(e) => {
                warn!("Error reading '{}': {e}", self.config.storage_key);
                Vec::new()
            }
        }
    }

    pub fn remove(&self, target: &RecordRef) -> Vec<R> {
        match self.try_remove(target) {
            Ok(records) => records,
            Err(e) => {
                warn!("Error removing from '{}': {e}", self.config.storage_key);
                Vec::new()
            }
        }
    }

    /// Drops the whole collection. Returns whether the delete succeeded.
    pub fn clear(&self) -> bool {
        match self.backend.remove(&self.config.storage_key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error clearing '{}': {e}", self.config.storage_key);
                false
            }
        }
    }

    /// Whether a record with this title (case-insensitive) is stored.
    pub fn contains(&self, title: &str) -> bool {
        let key = identity_key_of(title);
        self.list().iter().any(|r| r.identity_key() == key)
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_upsert(&self, mut candidate: R) -> Result<Vec<R>, StorageError> {
        let mut records = self.load()?;
        let key = candidate.identity_key();
        records.retain(|r| r.identity_key() != key);

        let now = Utc::now();
        let id = next_id(now.timestamp_millis(), &records);
        candidate.stamp(id, now, self.config.timestamp_field);
        records.insert(0, candidate);

        if let Some(capacity) = self.config.capacity {
            if records.len() > capacity {
                debug!(
                    "Evicting {} oldest entries from '{}'",
                    records.len() - capacity,
                    self.config.storage_key
                );
                records.truncate(capacity);
            }
        }

        self.save(&records)?;
        Ok(records)
    }

    fn try_remove(&self, target: &RecordRef) -> Result<Vec<R>, StorageError> {
        let mut records = self.load()?;
        records.retain(|r| !target.matches(r));
        self.save(&records)?;
        Ok(records)
    }

    fn load(&self) -> Result<Vec<R>, StorageError> {
        match self.backend.get(&self.config.storage_key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, records: &[R]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records)?;
        self.backend.set(&self.config.storage_key, &json)
    }
}

/// Millisecond clock value, bumped past every id already in the store so ids
/// stay strictly increasing even within one millisecond.
fn next_id<R: StoredRecord>(now_ms: i64, records: &[R]) -> i64 {
    let highest = records.iter().map(|r| r.id()).max().unwrap_or(i64::MIN);
    now_ms.max(highest.saturating_add(1))
}
