//! Persisted book record.
//!
//! [`BookRecord`] is the only shape written to storage. Both the scan history
//! and the favorites collection hold JSON arrays of it; they differ only in
//! which timestamp field the store stamps (`scannedAt` or `savedAt`).
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "title": "Dune",
//!   "author": "Frank Herbert",
//!   "summary": "A desert planet, a noble house, a prophecy.",
//!   "genre": ["Science Fiction"],
//!   "estimatedRating": "4.3/5",
//!   "similarBooks": ["Hyperion"],
//!   "contentWarnings": [],
//!   "confidence": "high",
//!   "id": 1718000000000,
//!   "scannedAt": "2024-06-10T08:53:20Z"
//! }
//! ```

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title the AI service answers with when it cannot identify a cover.
pub const UNKNOWN_TITLE: &str = "UNKNOWN";

/// Rating placeholder used when the service gives none.
pub const NO_RATING: &str = "N/A";

/// How sure the AI service was about the identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl Confidence {
    /// Case-insensitive parse. Anything unrecognised reads as `Low`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// A book identified from a cover scan.
///
/// `id` and the timestamp fields are owned by the store the record lives in:
/// every upsert overwrites them. A copy saved to favorites therefore gets its
/// own `id` and `savedAt` independent of the history entry it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub title: String,
    pub author: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub genre: Vec<String>,

    #[serde(default = "default_rating")]
    pub estimated_rating: String,

    #[serde(default)]
    pub similar_books: Vec<String>,

    #[serde(default)]
    pub content_warnings: Vec<String>,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default)]
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

fn default_rating() -> String {
    NO_RATING.to_string()
}

impl BookRecord {
    /// Bare record with every optional field at its default.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            summary: String::new(),
            genre: Vec::new(),
            estimated_rating: default_rating(),
            similar_books: Vec::new(),
            content_warnings: Vec::new(),
            confidence: Confidence::default(),
            id: 0,
            scanned_at: None,
            saved_at: None,
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genre = genres.into_iter().map(Into::into).collect();
        self
    }

    /// Lower-cased title. Two records with the same key are the same book.
    pub fn identity_key(&self) -> String {
        identity_key_of(&self.title)
    }

    /// True for the "could not identify this cover" answer.
    pub fn is_unidentified(&self) -> bool {
        self.title.trim() == UNKNOWN_TITLE
    }
}

/// Normalizes a title into an identity key.
pub fn identity_key_of(title: &str) -> String {
    title.to_lowercase()
}
