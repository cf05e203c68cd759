use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One showing of a film as emitted by a parser, before merging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningRecord {
    pub title: String,
    pub alt_title: Option<String>,
    pub raw_director: Option<String>,
    pub date: NaiveDate,
    pub time: String, // zero-padded HH:MM
    pub source_url: Option<String>,
    pub source_id: String,
    pub poster: Option<String>,
    pub genre: Vec<String>,
    pub cycle: Option<String>,
    pub guests: Option<String>,
}

impl ScreeningRecord {
    pub fn new(source_id: impl Into<String>, title: impl Into<String>, date: NaiveDate, time: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            alt_title: None,
            raw_director: None,
            date,
            time: time.into(),
            source_url: None,
            source_id: source_id.into(),
            poster: None,
            genre: Vec::new(),
            cycle: None,
            guests: None,
        }
    }
}
