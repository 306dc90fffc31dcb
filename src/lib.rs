//! # BookLens Core
//!
//! Local storage and AI response handling for the BookLens book-cover
//! scanner, designed for FFI (Foreign Function Interface) integration with
//! Flutter and other cross-platform UIs.
//!
//! ## Features
//!
//! - **Scan history**: the last 50 identified books, newest first, one entry per title
//! - **Favorites**: an uncapped saved-books collection with the same dedup rules
//! - **Reading preferences**: top genres, repeat authors and recent reads from history
//! - **Response extraction**: typed, validated records from freeform AI text
//! - **LMDB-based storage**: both collections persist in one memory-mapped environment
//! - **Fail-safe stores**: storage failures degrade to empty results, never panics
//!
//! ## Quick Start
//!
//! ```no_run
//! use booklens_core::{open_library, history_upsert, free_response};
//! use std::ffi::CString;
//!
//! let config = CString::new(r#"{"dbName":"my_books"}"#).unwrap();
//! let library = open_library(config.as_ptr());
//!
//! let book = CString::new(r#"{"title":"Dune","author":"Frank Herbert"}"#).unwrap();
//! let result = history_upsert(library, book.as_ptr());
//! free_response(result);
//! ```
//!
//! ## FFI Functions
//!
//! Every function returning `*const c_char` returns a JSON [`AppResponse`]
//! envelope that must be released with [`free_response`].
//!
//! - [`open_library`] / [`close_library`] - Library lifecycle
//! - [`history_upsert`], [`history_list`], [`history_remove`], [`history_clear`]
//! - [`favorites_upsert`], [`favorites_list`], [`favorites_remove`],
//!   [`favorites_contains`], [`favorites_clear`]
//! - [`reading_preferences`], [`get_recommendation_context`], [`recommendation_request`]
//! - [`request_prompt`] - Instruction text for a request payload
//! - [`extract_response`] - Validate an AI answer for a given mode

pub mod ai_model;
pub mod config;
pub mod extractor;
pub mod library;
pub mod local_db_model;
pub mod local_db_state;
pub mod preferences;
pub mod prompt_context;
pub mod record_store;
pub mod requests;
pub mod service;
pub mod storage;
mod app_response;

pub use crate::app_response::AppResponse;

use crate::config::LibraryConfig;
use crate::extractor::{extract, ResponseMode};
use crate::library::Library;
use crate::local_db_model::BookRecord;
use crate::record_store::{RecordRef, RecordStore};
use crate::requests::{AiRequest, RecommendationRequest};

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use log::{info, warn};

/// Opens the library described by a JSON [`LibraryConfig`].
///
/// A null pointer or an empty string opens the default configuration
/// (`booklens.lmdb` in the working directory).
///
/// # Returns
///
/// A pointer to the [`Library`], or null when the configuration is invalid
/// or the LMDB environment cannot be opened. Release it with
/// [`close_library`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use booklens_core::open_library;
///
/// let config = CString::new(r#"{"dbName":"scanner","historyCapacity":50}"#).unwrap();
/// let library = open_library(config.as_ptr());
///
/// if !library.is_null() {
///     // Library opened successfully
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn open_library(config_json: *const c_char) -> *mut Library {
    let raw = if config_json.is_null() {
        String::new()
    } else {
        match unsafe { CStr::from_ptr(config_json).to_str() } {
            Ok(s) => s.to_string(),
            Err(e) => {
                warn!("Invalid UTF-8 in library config: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    let config = match LibraryConfig::from_json(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!("Invalid library config: {e}");
            return std::ptr::null_mut();
        }
    };

    match Library::open(&config) {
        Ok(library) => {
            info!("✅ Library '{}' opened", config.db_name);
            Box::into_raw(Box::new(library))
        }
        Err(e) => {
            warn!("❌ Failed to open library '{}': {e}", config.db_name);
            std::ptr::null_mut()
        }
    }
}

/// Flushes and releases a library returned by [`open_library`].
///
/// The pointer must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_library(state: *mut Library) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_library".to_string());
        return response_to_c_string(&error);
    }

    let library = unsafe { Box::from_raw(state) };
    let response = match library.close() {
        Ok(()) => AppResponse::success("Library closed successfully"),
        Err(e) => AppResponse::from(e),
    };
    drop(library);
    response_to_c_string(&response)
}

/// Records a scanned book (JSON [`BookRecord`]) at the top of history.
///
/// Returns the updated history. An empty list means the write had no
/// durable effect.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn history_upsert(state: *mut Library, json_ptr: *const c_char) -> *const c_char {
    with_library(state, "history_upsert", |library| {
        upsert_into(library.history(), json_ptr)
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn history_list(state: *mut Library) -> *const c_char {
    with_library(state, "history_list", |library| {
        AppResponse::json(&library.history().list())
    })
}

/// Removes the history entry with the given id.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn history_remove(state: *mut Library, id: i64) -> *const c_char {
    with_library(state, "history_remove", |library| {
        AppResponse::json(&library.history().remove(&RecordRef::Id(id)))
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn history_clear(state: *mut Library) -> *const c_char {
    with_library(state, "history_clear", |library| {
        AppResponse::json(&library.history().clear())
    })
}

/// Saves a book (JSON [`BookRecord`]) to favorites as an independent copy.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_upsert(state: *mut Library, json_ptr: *const c_char) -> *const c_char {
    with_library(state, "favorites_upsert", |library| {
        match parse_book(json_ptr) {
            Ok(book) => AppResponse::json(&library.save_favorite(&book)),
            Err(error) => error,
        }
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_list(state: *mut Library) -> *const c_char {
    with_library(state, "favorites_list", |library| {
        AppResponse::json(&library.favorites().list())
    })
}

/// Removes a favorite by title, matched case-insensitively.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_remove(state: *mut Library, title: *const c_char) -> *const c_char {
    with_library(state, "favorites_remove", |library| {
        match c_ptr_to_string(title, "title") {
            Ok(title) => AppResponse::json(&library.favorites().remove(&RecordRef::Title(title))),
            Err(error) => error,
        }
    })
}

/// `Ok("true")` when a favorite with this title (any case) exists.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_contains(state: *mut Library, title: *const c_char) -> *const c_char {
    with_library(state, "favorites_contains", |library| {
        match c_ptr_to_string(title, "title") {
            Ok(title) => AppResponse::json(&library.favorites().contains(&title)),
            Err(error) => error,
        }
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_clear(state: *mut Library) -> *const c_char {
    with_library(state, "favorites_clear", |library| {
        AppResponse::json(&library.favorites().clear())
    })
}

/// Reading preferences derived from history, or `Ok("null")` when nothing
/// has been scanned yet.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reading_preferences(state: *mut Library) -> *const c_char {
    with_library(state, "reading_preferences", |library| {
        AppResponse::json(&library.preferences())
    })
}

/// Preference context text for a recommendation prompt; empty when history is.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_recommendation_context(state: *mut Library) -> *const c_char {
    with_library(state, "get_recommendation_context", |library| {
        AppResponse::Ok(library.recommendation_context())
    })
}

/// The recommendation request (JSON [`AiRequest`]) for the current history.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn recommendation_request(state: *mut Library) -> *const c_char {
    with_library(state, "recommendation_request", |library| {
        match RecommendationRequest::new(library.preferences()) {
            Ok(request) => AppResponse::json(&AiRequest::Recommendations(request)),
            Err(e) => AppResponse::from(e),
        }
    })
}

/// Validates a JSON [`AiRequest`] and returns the instruction text to send
/// with it.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn request_prompt(json_ptr: *const c_char) -> *const c_char {
    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error) => return response_to_c_string(&error),
    };

    let response = match serde_json::from_str::<AiRequest>(&json_str) {
        Ok(request) => match request.validate() {
            Ok(request) => AppResponse::Ok(request.prompt()),
            Err(e) => AppResponse::from(e),
        },
        Err(e) => AppResponse::SerializationError(format!("Invalid request JSON: {e}")),
    };
    response_to_c_string(&response)
}

/// Extracts a typed record from freeform AI text.
///
/// `mode` is one of `scan`, `detailed`, `price`, `recommendation`. The `Ok`
/// payload is `{"mode": ..., "data": {...}}`; failures come back as
/// `ExtractionError` envelopes the UI should offer a retry for.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use booklens_core::{extract_response, free_response};
///
/// let mode = CString::new("scan").unwrap();
/// let text = CString::new("Here you go: {\"title\":\"Dune\",\"author\":\"Frank Herbert\"}").unwrap();
/// let result = extract_response(mode.as_ptr(), text.as_ptr());
/// free_response(result);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn extract_response(mode: *const c_char, text: *const c_char) -> *const c_char {
    let mode_str = match c_ptr_to_string(mode, "mode") {
        Ok(mode) => mode,
        Err(error) => return response_to_c_string(&error),
    };
    let Some(mode) = ResponseMode::parse(&mode_str) else {
        let error = AppResponse::BadRequest(format!("Unknown response mode: {mode_str}"));
        return response_to_c_string(&error);
    };
    let text = match c_ptr_to_string(text, "text") {
        Ok(text) => text,
        Err(error) => return response_to_c_string(&error),
    };

    let response = match extract(&text, mode) {
        Ok(record) => AppResponse::json(&record),
        Err(e) => {
            warn!("Extraction failed for {mode:?}: {e}");
            AppResponse::from(e)
        }
    };
    response_to_c_string(&response)
}

/// Releases a string returned by any function in this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

fn with_library(
    state: *mut Library,
    operation: &str,
    f: impl FnOnce(&Library) -> AppResponse,
) -> *const c_char {
    let response = match unsafe { state.as_ref() } {
        Some(library) => f(library),
        None => AppResponse::BadRequest(format!("Null state pointer passed to {operation}")),
    };
    response_to_c_string(&response)
}

fn upsert_into(store: &RecordStore<BookRecord>, json_ptr: *const c_char) -> AppResponse {
    match parse_book(json_ptr) {
        Ok(book) => AppResponse::json(&store.upsert(book)),
        Err(error) => error,
    }
}

fn parse_book(json_ptr: *const c_char) -> Result<BookRecord, AppResponse> {
    let json_str = c_ptr_to_string(json_ptr, "JSON")?;
    let book: BookRecord = serde_json::from_str(&json_str)
        .map_err(|e| AppResponse::SerializationError(format!("Invalid JSON: {e}")))?;
    if book.title.trim().is_empty() {
        return Err(AppResponse::ValidationError("Book title must not be empty".to_string()));
    }
    Ok(book)
}

/// Serializes a response to a C string. Null if serialization fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a `String`, rejecting null pointers and
/// invalid UTF-8 with a `BadRequest` naming `field_name`.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, AppResponse> {
    if ptr.is_null() {
        return Err(AppResponse::BadRequest(format!("Null {field_name} pointer")));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => Err(AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"))),
    }
}
