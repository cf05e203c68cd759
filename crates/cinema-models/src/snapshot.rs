use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::month::Month;
use crate::movie::Movie;

/// Persisted listing of one source for one month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthSnapshot {
    pub month: Month,
    pub theater: String, // display name
    pub last_updated: DateTime<Utc>,
    pub total_movies: usize,
    pub movies: Vec<Movie>,
}

impl MonthSnapshot {
    pub fn new(month: Month, theater: impl Into<String>, movies: Vec<Movie>) -> Self {
        Self {
            month,
            theater: theater.into(),
            last_updated: Utc::now(),
            total_movies: movies.len(),
            movies,
        }
    }
}
