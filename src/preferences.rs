//! Reading preferences derived from a history snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::local_db_model::BookRecord;

const TOP_GENRES: usize = 3;
const TOP_AUTHORS: usize = 3;
const RECENT_BOOKS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSummary {
    pub top_genres: Vec<String>,
    pub favorite_authors: Vec<String>,
    pub total_scanned: usize,
    pub recent_books: Vec<BookRecord>,
}

/// Summarizes `history` (newest first).
///
/// Returns `None` for an empty history so "nothing scanned yet" stays
/// distinguishable from a computed summary with empty lists.
pub fn analyze_preferences(history: &[BookRecord]) -> Option<PreferenceSummary> {
    if history.is_empty() {
        return None;
    }

    let mut genres = FrequencyTable::default();
    for genre in history.iter().flat_map(|book| book.genre.iter()) {
        genres.bump(genre);
    }

    let mut authors = FrequencyTable::default();
    for book in history {
        authors.bump(&book.author);
    }

    Some(PreferenceSummary {
        top_genres: genres.top(TOP_GENRES, 1),
        favorite_authors: authors.top(TOP_AUTHORS, 2),
        total_scanned: history.len(),
        recent_books: history.iter().take(RECENT_BOOKS).cloned().collect(),
    })
}

/// Counts keyed by exact string, remembering first-seen order.
#[derive(Default)]
struct FrequencyTable {
    slots: HashMap<String, usize>,
    counts: Vec<(String, usize)>,
}

impl FrequencyTable {
    fn bump(&mut self, key: &str) {
        match self.slots.get(key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.slots.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), 1));
            }
        }
    }

    /// The `limit` most frequent keys seen at least `min_count` times.
    /// Equal counts keep first-seen order (`sort_by` is stable).
    fn top(mut self, limit: usize, min_count: usize) -> Vec<String> {
        self.counts.retain(|(_, count)| *count >= min_count);
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
            .into_iter()
            .take(limit)
            .map(|(key, _)| key)
            .collect()
    }
}
