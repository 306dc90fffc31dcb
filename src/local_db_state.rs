//! LMDB-backed persistence backend.
//!
//! One environment directory (`<name>.lmdb`) holds a single named database.
//! Each storage key maps to one LMDB entry whose value is the UTF-8 JSON of a
//! whole record collection, so every `set` is one write transaction.

use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::storage::{StorageBackend, StorageError};

const DB_NAME: &str = "booklens";

pub struct AppDbState {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl AppDbState {
    /// Opens (or creates) `<name>.lmdb` relative to the working directory.
    pub fn init(name: &str, map_size_mb: usize) -> Result<Self, StorageError> {
        let dir = PathBuf::from(format!("{name}.lmdb"));
        Self::open(&dir, map_size_mb)
    }

    /// Opens (or creates) an environment in `dir`.
    pub fn open(dir: &Path, map_size_mb: usize) -> Result<Self, StorageError> {
        let map_size = map_size_mb
            .max(1)
            .checked_mul(1024 * 1024)
            .ok_or_else(|| StorageError::Backend("map size too large".to_string()))?;

        std::fs::create_dir_all(dir).map_err(|e| {
            StorageError::Backend(format!("cannot create {}: {e}", dir.display()))
        })?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(dir)?;
        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        info!("LMDB environment ready at {}", dir.display());
        Ok(Self {
            env,
            db,
            path: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes pending writes to disk. The environment itself closes on drop.
    pub fn close_database(&self) -> Result<(), StorageError> {
        self.env.sync(true).map_err(|e| {
            warn!("Failed to sync LMDB environment at {}: {e}", self.path.display());
            StorageError::from(e)
        })
    }
}

impl StorageBackend for AppDbState {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(std::str::from_utf8(bytes)?.to_string()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) => txn.commit()?,
            Err(lmdb::Error::NotFound) => debug!("Nothing stored under '{key}'"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
