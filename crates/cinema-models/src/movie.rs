use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Normalized movie: one title at one theater on one date.
///
/// Field names are camelCase on disk; the snapshot format depends on them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub alt_title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub director: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>, // minutes
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub poster: Option<String>,
    pub theater: String,
    pub showtimes: BTreeSet<String>, // unique, ascending HH:MM
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub film_url: Option<String>,
    pub source: String,

    // Enrichment
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "empty_as_none")]
    pub plot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "empty_as_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,

    // Programme notes
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "empty_as_none")]
    pub cycle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "empty_as_none")]
    pub guests: Option<String>,
}

impl Movie {
    pub fn earliest_showtime(&self) -> &str {
        crate::showtime::earliest_showtime(&self.showtimes)
    }

    pub fn is_enriched(&self) -> bool {
        self.tmdb_id.is_some()
    }
}

/// Older snapshots wrote `""` for unknown text fields
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
