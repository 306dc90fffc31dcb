use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::record_store::{FAVORITES_KEY, HISTORY_KEY, MAX_HISTORY};

/// Settings accepted by [`crate::library::Library::open`] and, as JSON, by
/// the `open_library` FFI entry point. Every field has a default, so `{}`
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfig {
    /// LMDB environment name; data lives in `<dbName>.lmdb/`.
    pub db_name: String,
    pub history_capacity: usize,
    pub history_key: String,
    pub favorites_key: String,
    pub map_size_mb: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            db_name: "booklens".to_string(),
            history_capacity: MAX_HISTORY,
            history_key: HISTORY_KEY.to_string(),
            favorites_key: FAVORITES_KEY.to_string(),
            map_size_mb: 10,
        }
    }
}

impl LibraryConfig {
    /// Parses a JSON config. Blank input means all defaults;
    /// `historyCapacity` must be at least 1.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json)?;
        if config.history_capacity == 0 {
            return Err(serde_json::Error::custom("historyCapacity must be at least 1"));
        }
        Ok(config)
    }
}
