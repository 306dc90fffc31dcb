//! Text blocks describing reading preferences for recommendation requests.
//!
//! Rendering is deterministic: the same summary always yields the same text,
//! so request payloads can be asserted on without the AI service.

use std::fmt::Write;

use crate::preferences::PreferenceSummary;

/// Context appended to a recommendation request.
///
/// Each line is emitted only when its list is non-empty, always in the order
/// genres, authors, recent titles. No summary renders as an empty string.
pub fn recommendation_context(summary: Option<&PreferenceSummary>) -> String {
    let Some(summary) = summary else {
        return String::new();
    };

    let mut out = String::from("\n\nBased on the user's reading history:\n");

    if !summary.top_genres.is_empty() {
        let _ = writeln!(out, "- Favorite genres: {}", summary.top_genres.join(", "));
    }
    if !summary.favorite_authors.is_empty() {
        let _ = writeln!(out, "- Favorite authors: {}", summary.favorite_authors.join(", "));
    }
    if !summary.recent_books.is_empty() {
        let titles: Vec<&str> = summary.recent_books.iter().map(|b| b.title.as_str()).collect();
        let _ = writeln!(out, "- Recently scanned: {}", titles.join(", "));
    }

    out.push_str("\nPlease provide personalized book recommendations that match these preferences.");
    out
}

/// The preferences section of the recommendation instruction, listing recent
/// reads as `"Title" by Author`. Same inclusion rules as
/// [`recommendation_context`], one line per non-empty list.
pub fn recommendation_preferences_block(summary: &PreferenceSummary) -> String {
    let mut lines = Vec::with_capacity(3);

    if !summary.top_genres.is_empty() {
        lines.push(format!("- Favorite Genres: {}", summary.top_genres.join(", ")));
    }
    if !summary.favorite_authors.is_empty() {
        lines.push(format!("- Favorite Authors: {}", summary.favorite_authors.join(", ")));
    }
    if !summary.recent_books.is_empty() {
        let reads: Vec<String> = summary
            .recent_books
            .iter()
            .map(|b| format!("\"{}\" by {}", b.title, b.author))
            .collect();
        lines.push(format!("- Recently Read: {}", reads.join(", ")));
    }

    lines.join("\n")
}
