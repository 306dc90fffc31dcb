//! Request payloads sent to the generative AI service.
//!
//! Each payload carries its inputs plus the instruction text describing the
//! JSON object expected back, so the extractor's schemas and the requests
//! stay in one crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extractor::ResponseMode;
use crate::preferences::PreferenceSummary;
use crate::prompt_context::recommendation_preferences_block;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("missing required input '{0}'")]
    MissingField(&'static str),
    #[error("no reading history to base recommendations on")]
    NoPreferences,
}

const SCAN_SHAPE: &str = r#"{
  "title": "Book title",
  "author": "Author name",
  "summary": "2-3 sentence spoiler-free description that captures mood and premise",
  "genre": ["Genre1", "Genre2"],
  "estimatedRating": "X.X/5 (estimated from reader reviews)",
  "similarBooks": ["Book 1", "Book 2", "Book 3"],
  "contentWarnings": ["Warning1", "Warning2"] or [],
  "confidence": "high/medium/low""#;

const DETAILED_SHAPE_EXTRA: &str = r#",
  "detailedPlot": "A longer premise and setup, still without twists or endings",
  "themes": ["Theme1", "Theme2"],
  "isSpoilerFree": true"#;

const UNKNOWN_SHAPE: &str = r#"{
  "title": "UNKNOWN",
  "author": "UNKNOWN",
  "summary": "I couldn't identify this book clearly. Please try a clearer photo of the cover.",
  "genre": [],
  "estimatedRating": "N/A",
  "similarBooks": [],
  "contentWarnings": [],
  "confidence": "low"
}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Base64 JPEG of the cover.
    pub image: String,
    #[serde(default)]
    pub detailed_summary: bool,
}

impl ScanRequest {
    pub fn new(image: impl Into<String>, detailed_summary: bool) -> Result<Self, RequestError> {
        let image = image.into();
        if image.trim().is_empty() {
            return Err(RequestError::MissingField("image"));
        }
        Ok(Self {
            image,
            detailed_summary,
        })
    }

    pub fn prompt(&self) -> String {
        let shape = if self.detailed_summary {
            format!("{SCAN_SHAPE}{DETAILED_SHAPE_EXTRA}\n}}")
        } else {
            format!("{SCAN_SHAPE}\n}}")
        };
        format!(
            "You are analyzing a book cover image. Please identify the book and provide information.\n\n\
             IMPORTANT RULES:\n\
             - Keep summaries SPOILER-FREE (only mention the basic premise, no plot twists or endings)\n\
             - Be concise but engaging\n\
             - If you're not confident about the book, say so\n\n\
             Please provide a JSON response with this EXACT structure:\n{shape}\n\n\
             If you cannot identify the book clearly, respond with:\n{UNKNOWN_SHAPE}"
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCheckRequest {
    pub title: String,
    pub author: String,
}

impl PriceCheckRequest {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Result<Self, RequestError> {
        let (title, author) = (title.into(), author.into());
        if title.trim().is_empty() {
            return Err(RequestError::MissingField("title"));
        }
        if author.trim().is_empty() {
            return Err(RequestError::MissingField("author"));
        }
        Ok(Self { title, author })
    }

    pub fn prompt(&self) -> String {
        format!(
            "Find current prices for this book: \"{}\" by {}\n\n\
             Search for prices at these retailers:\n\
             - Amazon\n- Target\n- ThriftBooks\n- Barnes & Noble\n- Walmart\n\n\
             Provide approximate current prices. If you don't know exact prices, \
             provide typical price ranges based on the book type.\n\n\
             Respond in JSON format:\n\
             {{\n  \"prices\": [\n    {{\n      \"retailer\": \"Amazon\",\n      \"price\": \"$X.XX\",\n      \
             \"format\": \"Paperback/Hardcover/Kindle\",\n      \"availability\": \"In Stock/Out of Stock/Pre-order\"\n    }}\n  ],\n  \
             \"note\": \"Brief note about price variations or deals\"\n}}",
            self.title, self.author
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub preferences: PreferenceSummary,
}

impl RecommendationRequest {
    /// Fails with [`RequestError::NoPreferences`] when history was empty.
    pub fn new(preferences: Option<PreferenceSummary>) -> Result<Self, RequestError> {
        preferences
            .map(|preferences| Self { preferences })
            .ok_or(RequestError::NoPreferences)
    }

    pub fn prompt(&self) -> String {
        format!(
            "You are a book recommendation expert. Based on a user's reading history, \
             provide personalized book recommendations.\n\n\
             USER'S READING PREFERENCES:\n{}\n\n\
             Please recommend 5 books that would match this user's taste. \
             For each book, explain WHY it matches their preferences.\n\n\
             Respond in JSON format:\n\
             {{\n  \"recommendations\": [\n    {{\n      \"title\": \"Book Title\",\n      \"author\": \"Author Name\",\n      \
             \"reason\": \"Why this matches their taste (2-3 sentences)\",\n      \"matchScore\": \"high/medium\",\n      \
             \"genre\": [\"Genre1\", \"Genre2\"]\n    }}\n  ],\n  \
             \"insight\": \"A brief insight about the user's reading taste (1-2 sentences)\"\n}}",
            recommendation_preferences_block(&self.preferences)
        )
    }
}

/// One request to the AI service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AiRequest {
    Scan(ScanRequest),
    PriceCheck(PriceCheckRequest),
    Recommendations(RecommendationRequest),
}

impl AiRequest {
    /// Re-applies the constructor checks to a request decoded from JSON.
    pub fn validate(self) -> Result<Self, RequestError> {
        match self {
            AiRequest::Scan(r) => ScanRequest::new(r.image, r.detailed_summary).map(AiRequest::Scan),
            AiRequest::PriceCheck(r) => {
                PriceCheckRequest::new(r.title, r.author).map(AiRequest::PriceCheck)
            }
            request @ AiRequest::Recommendations(_) => Ok(request),
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            AiRequest::Scan(request) => request.prompt(),
            AiRequest::PriceCheck(request) => request.prompt(),
            AiRequest::Recommendations(request) => request.prompt(),
        }
    }

    /// Mode to extract the response with.
    pub fn response_mode(&self) -> ResponseMode {
        match self {
            AiRequest::Scan(request) if request.detailed_summary => ResponseMode::Detailed,
            AiRequest::Scan(_) => ResponseMode::Scan,
            AiRequest::PriceCheck(_) => ResponseMode::Price,
            AiRequest::Recommendations(_) => ResponseMode::Recommendation,
        }
    }
}
