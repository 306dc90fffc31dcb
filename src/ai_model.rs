//! Transient records decoded from AI responses. None of these are persisted.

use serde::{Deserialize, Serialize};

use crate::local_db_model::{BookRecord, Confidence};

/// Scan answer with the long-form fields requested in detailed mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedBookRecord {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub genre: Vec<String>,
    pub estimated_rating: String,
    pub similar_books: Vec<String>,
    pub content_warnings: Vec<String>,
    pub confidence: Confidence,
    pub detailed_plot: String,
    pub themes: Vec<String>,
    pub is_spoiler_free: bool,
}

impl DetailedBookRecord {
    /// Drops the detailed fields, keeping what history stores.
    pub fn into_book_record(self) -> BookRecord {
        BookRecord {
            summary: self.summary,
            genre: self.genre,
            estimated_rating: self.estimated_rating,
            similar_books: self.similar_books,
            content_warnings: self.content_warnings,
            confidence: self.confidence,
            ..BookRecord::new(self.title, self.author)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub retailer: String,
    pub price: String,
    pub format: String,
    pub availability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReport {
    pub prices: Vec<PriceQuote>,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScore {
    High,
    #[default]
    Medium,
}

impl MatchScore {
    /// `high` (any case) is high; everything else is medium.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("high") {
            MatchScore::High
        } else {
            MatchScore::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    pub reason: String,
    pub match_score: MatchScore,
    pub genre: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub insight: String,
}
