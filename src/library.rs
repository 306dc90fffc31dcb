//! The scan history and favorites collections over one backend.

use std::sync::Arc;

use log::info;

use crate::config::LibraryConfig;
use crate::local_db_model::BookRecord;
use crate::local_db_state::AppDbState;
use crate::preferences::{analyze_preferences, PreferenceSummary};
use crate::prompt_context::recommendation_context;
use crate::record_store::{RecordRef, RecordStore, StoreConfig};
use crate::storage::{StorageBackend, StorageError};

pub struct Library {
    history: RecordStore<BookRecord>,
    favorites: RecordStore<BookRecord>,
    lmdb: Option<Arc<AppDbState>>,
}

impl Library {
    /// Opens the LMDB environment named in `config`.
    pub fn open(config: &LibraryConfig) -> Result<Self, StorageError> {
        let state = Arc::new(AppDbState::init(&config.db_name, config.map_size_mb)?);
        let mut library = Self::with_backend(state.clone(), config);
        library.lmdb = Some(state);
        Ok(library)
    }

    pub fn with_backend(backend: Arc<dyn StorageBackend>, config: &LibraryConfig) -> Self {
        let history = StoreConfig {
            storage_key: config.history_key.clone(),
            capacity: Some(config.history_capacity),
            ..StoreConfig::history()
        };
        let favorites = StoreConfig {
            storage_key: config.favorites_key.clone(),
            ..StoreConfig::favorites()
        };
        Self {
            history: RecordStore::new(backend.clone(), history),
            favorites: RecordStore::new(backend, favorites),
            lmdb: None,
        }
    }

    pub fn history(&self) -> &RecordStore<BookRecord> {
        &self.history
    }

    pub fn favorites(&self) -> &RecordStore<BookRecord> {
        &self.favorites
    }

    pub fn record_scan(&self, book: BookRecord) -> Vec<BookRecord> {
        self.history.upsert(book)
    }

    /// Saves an independent copy of `book` with its own id and `savedAt`.
    pub fn save_favorite(&self, book: &BookRecord) -> Vec<BookRecord> {
        let mut copy = book.clone();
        copy.scanned_at = None;
        self.favorites.upsert(copy)
    }

    /// Removes `book` from favorites when saved, saves it otherwise.
    /// Returns whether the book is saved afterwards.
    pub fn toggle_favorite(&self, book: &BookRecord) -> bool {
        if self.favorites.contains(&book.title) {
            self.favorites.remove(&RecordRef::Title(book.title.clone()));
        } else {
            self.save_favorite(book);
        }
        self.favorites.contains(&book.title)
    }

    pub fn preferences(&self) -> Option<PreferenceSummary> {
        analyze_preferences(&self.history.list())
    }

    pub fn recommendation_context(&self) -> String {
        recommendation_context(self.preferences().as_ref())
    }

    /// Flushes the LMDB environment, if this library owns one.
    pub fn close(&self) -> Result<(), StorageError> {
        if let Some(state) = &self.lmdb {
            state.close_database()?;
            info!("Closed library at {}", state.path().display());
        }
        Ok(())
    }
}
