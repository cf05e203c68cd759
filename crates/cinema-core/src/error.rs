use cinema_sources::{FetchError, ParseError};
use thiserror::Error;

/// Hard failures of a query. Everything else degrades to fewer or staler results.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("snapshot store error: {0}")]
    Cache(anyhow::Error),

    #[error("every source failed: {}", .0.join("; "))]
    AllSourcesFailed(Vec<String>),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
