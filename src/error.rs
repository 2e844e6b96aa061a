//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for application-level termdex operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` in the store and CLI layers. The index itself reports
/// the typed errors below.
pub type Result<T, E = anyhow::Error> = anyhow::Result<T, E>;

/// Error returned when building an index fails outright.
///
/// Individual malformed documents never cause this; they are skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("no indexable documents ({skipped} skipped)")]
    NoIndexableDocuments { skipped: usize },
}

/// Error returned when an index cannot be encoded into a wire format.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode index as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode binary index: {0}")]
    Binary(#[from] postcard::Error),
}

/// Error returned when a serialized index cannot be turned back into an index.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read index at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed index data: {0}")]
    Malformed(String),
    #[error("unsupported index schema {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },
    #[error("postings for '{term}' reference document {ordinal}, but only {count} documents exist")]
    OrdinalOutOfRange {
        term: String,
        ordinal: u32,
        count: usize,
    },
    #[error("postings for '{term}' are not strictly ascending")]
    UnorderedPostings { term: String },
    #[error("term '{term}' has no postings")]
    EmptyPostings { term: String },
    #[error("index contains no documents")]
    NoDocuments,
    #[error("document list has {filenames} filenames but {titles} titles")]
    DocumentListMismatch { filenames: usize, titles: usize },
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<postcard::Error> for LoadError {
    fn from(e: postcard::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Returned by searches when no index is loaded, so callers can tell
/// "no index" apart from "no matches".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("search index unavailable: {reason}")]
pub struct IndexUnavailable {
    pub reason: String,
}
