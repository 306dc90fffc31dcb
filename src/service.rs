//! One user action, one round trip to the AI service.
//!
//! [`BookLens`] sends a request through a caller-supplied
//! [`GenerativeService`], extracts the answer and records scans in history.
//! The call blocks until the service answers or fails; timeouts, retries
//! and cancellation belong to the service implementation.

use log::{info, warn};
use thiserror::Error;

use crate::ai_model::{DetailedBookRecord, PriceReport, RecommendationReport};
use crate::extractor::{
    extract_detailed, extract_prices, extract_recommendations, extract_scan, ExtractionError,
};
use crate::library::Library;
use crate::local_db_model::BookRecord;
use crate::requests::{
    AiRequest, PriceCheckRequest, RecommendationRequest, RequestError, ScanRequest,
};

/// Failure reported by the transport, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Anything that can answer an [`AiRequest`] with freeform text.
pub trait GenerativeService {
    fn generate(&self, request: &AiRequest) -> Result<String, TransportError>;
}

impl<F> GenerativeService for F
where
    F: Fn(&AiRequest) -> Result<String, TransportError>,
{
    fn generate(&self, request: &AiRequest) -> Result<String, TransportError> {
        self(request)
    }
}

#[derive(Debug, Error)]
pub enum LensError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("AI service request failed: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

pub struct BookLens<S> {
    service: S,
    library: Library,
}

impl<S: GenerativeService> BookLens<S> {
    pub fn new(service: S, library: Library) -> Self {
        Self { service, library }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Identifies a cover. Identified books are recorded in history; the
    /// `UNKNOWN` answer is returned as-is and not recorded.
    pub fn scan(&self, image: &str) -> Result<BookRecord, LensError> {
        let request = AiRequest::Scan(ScanRequest::new(image, false)?);
        let book = extract_scan(&self.round_trip(&request)?)?;
        self.record(&book);
        Ok(book)
    }

    /// Like [`BookLens::scan`], with the long-form fields. History keeps the
    /// base record only.
    pub fn scan_detailed(&self, image: &str) -> Result<DetailedBookRecord, LensError> {
        let request = AiRequest::Scan(ScanRequest::new(image, true)?);
        let detailed = extract_detailed(&self.round_trip(&request)?)?;
        self.record(&detailed.clone().into_book_record());
        Ok(detailed)
    }

    pub fn check_prices(&self, title: &str, author: &str) -> Result<PriceReport, LensError> {
        let request = AiRequest::PriceCheck(PriceCheckRequest::new(title, author)?);
        Ok(extract_prices(&self.round_trip(&request)?)?)
    }

    /// Recommendations from current history. Fails with
    /// [`RequestError::NoPreferences`] before any request when history is empty.
    pub fn recommend(&self) -> Result<RecommendationReport, LensError> {
        let request = AiRequest::Recommendations(RecommendationRequest::new(
            self.library.preferences(),
        )?);
        Ok(extract_recommendations(&self.round_trip(&request)?)?)
    }

    fn round_trip(&self, request: &AiRequest) -> Result<String, TransportError> {
        self.service.generate(request).map_err(|e| {
            warn!("AI request for {:?} failed: {e}", request.response_mode());
            e
        })
    }

    fn record(&self, book: &BookRecord) {
        if book.is_unidentified() {
            info!("Cover not identified, history unchanged");
            return;
        }
        if self.library.record_scan(book.clone()).is_empty() {
            warn!("Scan of '{}' was not saved to history", book.title);
        }
    }
}
