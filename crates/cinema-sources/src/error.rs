use thiserror::Error;

/// Network-level failure reading a page
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure, including timeouts
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// A page could not be read at all; the upstream format probably changed.
///
/// Malformed individual screenings never surface as a `ParseError`, they
/// are dropped inside the parser.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{source_id}: page structure not recognised: {message}")]
    Structure { source_id: String, message: String },
}

impl ParseError {
    pub fn structure(source_id: &str, message: impl Into<String>) -> Self {
        ParseError::Structure {
            source_id: source_id.to_string(),
            message: message.into(),
        }
    }
}

/// Why a single fragment was dropped
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct RecordError {
    pub reason: String,
}

impl RecordError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("TMDB request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("TMDB API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("TMDB response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
