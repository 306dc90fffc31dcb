//! Structured extraction of AI service responses.
//!
//! The service answers in freeform text that should embed one JSON object,
//! often wrapped in prose or a markdown fence. Extraction runs three steps
//! for every mode:
//!
//! 1. cut the text from the first `{` to the last `}`;
//! 2. decode that slice as a JSON object;
//! 3. check the mandatory fields listed for the mode in [`schema_for`].
//!
//! Everything past the mandatory fields is decoded leniently: absent or
//! oddly-typed optional fields fall back to defaults instead of failing.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ai_model::{
    DetailedBookRecord, MatchScore, PriceQuote, PriceReport, Recommendation, RecommendationReport,
};
use crate::local_db_model::{BookRecord, Confidence, NO_RATING};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no JSON object found in response")]
    NoPayloadFound,
    #[error("response payload is not valid JSON: {0}")]
    ParseFailure(String),
    #[error("response is missing required field '{field}'")]
    SchemaViolation { field: String },
}

impl ExtractionError {
    fn missing(field: impl Into<String>) -> Self {
        ExtractionError::SchemaViolation {
            field: field.into(),
        }
    }
}

/// Which record shape the caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Scan,
    Detailed,
    Price,
    Recommendation,
}

impl ResponseMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scan" => Some(ResponseMode::Scan),
            "detailed" => Some(ResponseMode::Detailed),
            "price" | "prices" => Some(ResponseMode::Price),
            "recommendation" | "recommendations" => Some(ResponseMode::Recommendation),
            _ => None,
        }
    }
}

/// Mandatory fields of one response mode.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Top-level fields that must be present. For `items` this is the list
    /// field itself; otherwise the value must be non-blank text.
    pub required: &'static [&'static str],
    /// List field whose elements are objects with their own required fields.
    pub items: Option<(&'static str, &'static [&'static str])>,
}

const BOOK_SCHEMA: Schema = Schema {
    required: &["title", "author"],
    items: None,
};

const PRICE_SCHEMA: Schema = Schema {
    required: &["prices"],
    items: Some(("prices", &["retailer", "price"])),
};

const RECOMMENDATION_SCHEMA: Schema = Schema {
    required: &["recommendations"],
    items: Some(("recommendations", &["title", "author"])),
};

pub fn schema_for(mode: ResponseMode) -> Schema {
    match mode {
        ResponseMode::Scan | ResponseMode::Detailed => BOOK_SCHEMA,
        ResponseMode::Price => PRICE_SCHEMA,
        ResponseMode::Recommendation => RECOMMENDATION_SCHEMA,
    }
}

/// A validated record of the requested mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "data", rename_all = "lowercase")]
pub enum Extracted {
    Scan(BookRecord),
    Detailed(DetailedBookRecord),
    Price(PriceReport),
    Recommendation(RecommendationReport),
}

pub fn extract(text: &str, mode: ResponseMode) -> Result<Extracted, ExtractionError> {
    let object = validated_object(text, mode)?;
    Ok(match mode {
        ResponseMode::Scan => Extracted::Scan(book_from(&object)),
        ResponseMode::Detailed => Extracted::Detailed(detailed_from(&object)),
        ResponseMode::Price => Extracted::Price(prices_from(&object)),
        ResponseMode::Recommendation => Extracted::Recommendation(recommendations_from(&object)),
    })
}

/// Scan answer. A `"UNKNOWN"` title is a successful extraction; check
/// [`BookRecord::is_unidentified`].
pub fn extract_scan(text: &str) -> Result<BookRecord, ExtractionError> {
    validated_object(text, ResponseMode::Scan).map(|o| book_from(&o))
}

pub fn extract_detailed(text: &str) -> Result<DetailedBookRecord, ExtractionError> {
    validated_object(text, ResponseMode::Detailed).map(|o| detailed_from(&o))
}

pub fn extract_prices(text: &str) -> Result<PriceReport, ExtractionError> {
    validated_object(text, ResponseMode::Price).map(|o| prices_from(&o))
}

pub fn extract_recommendations(text: &str) -> Result<RecommendationReport, ExtractionError> {
    validated_object(text, ResponseMode::Recommendation).map(|o| recommendations_from(&o))
}

/// Slice from the first `{` to the last `}`, inclusive.
fn locate_payload(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn validated_object(text: &str, mode: ResponseMode) -> Result<Map<String, Value>, ExtractionError> {
    let payload = locate_payload(text).ok_or(ExtractionError::NoPayloadFound)?;

    let object: Map<String, Value> = serde_json::from_str(payload)
        .map_err(|e| ExtractionError::ParseFailure(e.to_string()))?;

    let schema = schema_for(mode);
    for field in schema.required {
        match schema.items {
            Some((list, _)) if list == *field => {
                if !matches!(object.get(*field), Some(Value::Array(_))) {
                    return Err(ExtractionError::missing(*field));
                }
            }
            _ => {
                required_text(&object, field).ok_or_else(|| ExtractionError::missing(*field))?;
            }
        }
    }

    if let Some((list, item_fields)) = schema.items {
        let items = object.get(list).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
        for (index, item) in items.iter().enumerate() {
            let Some(item) = item.as_object() else {
                return Err(ExtractionError::missing(format!("{list}[{index}]")));
            };
            for field in item_fields {
                if required_text(item, field).is_none() {
                    return Err(ExtractionError::missing(format!("{list}[{index}].{field}")));
                }
            }
        }
    }

    debug!("Extracted {mode:?} payload ({} bytes)", payload.len());
    Ok(object)
}

/// Non-blank text, or a number rendered as text.
fn required_text(object: &Map<String, Value>, field: &str) -> Option<String> {
    match object.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_or(object: &Map<String, Value>, field: &str, default: &str) -> String {
    match object.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

/// A list of strings. A lone string becomes a one-element list and
/// non-string elements are dropped.
fn text_list(object: &Map<String, Value>, field: &str) -> Vec<String> {
    match object.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn bool_or(object: &Map<String, Value>, field: &str, default: bool) -> bool {
    match object.get(field) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => true,
            "false" | "no" => false,
            _ => default,
        },
        _ => default,
    }
}

fn book_from(object: &Map<String, Value>) -> BookRecord {
    BookRecord {
        summary: text_or(object, "summary", ""),
        genre: text_list(object, "genre"),
        estimated_rating: text_or(object, "estimatedRating", NO_RATING),
        similar_books: text_list(object, "similarBooks"),
        content_warnings: text_list(object, "contentWarnings"),
        confidence: Confidence::parse(&text_or(object, "confidence", "low")),
        ..BookRecord::new(
            required_text(object, "title").unwrap_or_default(),
            required_text(object, "author").unwrap_or_default(),
        )
    }
}

fn detailed_from(object: &Map<String, Value>) -> DetailedBookRecord {
    let book = book_from(object);
    DetailedBookRecord {
        title: book.title,
        author: book.author,
        summary: book.summary,
        genre: book.genre,
        estimated_rating: book.estimated_rating,
        similar_books: book.similar_books,
        content_warnings: book.content_warnings,
        confidence: book.confidence,
        detailed_plot: text_or(object, "detailedPlot", ""),
        themes: text_list(object, "themes"),
        is_spoiler_free: bool_or(object, "isSpoilerFree", true),
    }
}

fn objects<'a>(object: &'a Map<String, Value>, field: &str) -> impl Iterator<Item = &'a Map<String, Value>> {
    object
        .get(field)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn prices_from(object: &Map<String, Value>) -> PriceReport {
    PriceReport {
        prices: objects(object, "prices")
            .map(|quote| PriceQuote {
                retailer: required_text(quote, "retailer").unwrap_or_default(),
                price: required_text(quote, "price").unwrap_or_default(),
                format: text_or(quote, "format", ""),
                availability: text_or(quote, "availability", ""),
            })
            .collect(),
        note: text_or(object, "note", ""),
    }
}

fn recommendations_from(object: &Map<String, Value>) -> RecommendationReport {
    RecommendationReport {
        recommendations: objects(object, "recommendations")
            .map(|rec| Recommendation {
                title: required_text(rec, "title").unwrap_or_default(),
                author: required_text(rec, "author").unwrap_or_default(),
                reason: text_or(rec, "reason", ""),
                match_score: MatchScore::parse(&text_or(rec, "matchScore", "medium")),
                genre: text_list(rec, "genre"),
            })
            .collect(),
        insight: text_or(object, "insight", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_spans_first_open_to_last_close() {
        let text = "Sure! {\"a\": {\"b\": 1}} trailing } noise";
        assert_eq!(locate_payload(text), Some("{\"a\": {\"b\": 1}} trailing }"));
        assert_eq!(locate_payload("} before {"), None);
        assert_eq!(locate_payload("no braces"), None);
    }

    #[test]
    fn mode_names_parse_case_insensitively() {
        assert_eq!(ResponseMode::parse("SCAN"), Some(ResponseMode::Scan));
        assert_eq!(ResponseMode::parse("prices"), Some(ResponseMode::Price));
        assert_eq!(ResponseMode::parse(" recommendations "), Some(ResponseMode::Recommendation));
        assert_eq!(ResponseMode::parse("summary"), None);
    }
}
