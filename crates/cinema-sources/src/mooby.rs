use chrono::NaiveDate;
use cinema_models::{normalize_showtime, Month, ScreeningRecord};
use serde_json::Value;
use tracing::{debug, warn};
use crate::error::ParseError;
use crate::text::{absolute_url, normalize_whitespace};
use crate::traits::{CinemaSource, ListingPage};

const BASE_URL: &str = "https://www.moobycinemas.com";
const SHOPS_MARKER: &str = "window.shops";

/// One Mooby venue.
///
/// Both Barcelona venues are served by the same page; a `window.shops`
/// JSON blob holds every shop and the venue is picked by its code.
pub struct MoobySource {
    slug: &'static str,
    theater: &'static str,
    shop_code: &'static str,
}

impl MoobySource {
    pub fn aribau() -> Self {
        Self {
            slug: "mooby-aribau",
            theater: "Mooby Aribau",
            shop_code: "BAL-ARIBAU",
        }
    }

    pub fn balmes() -> Self {
        Self {
            slug: "mooby-balmes",
            theater: "Mooby Balmes",
            shop_code: "BAL-BALMES",
        }
    }

    fn find_shop<'a>(&self, shops: &'a Value) -> Option<&'a Value> {
        let mut candidates: Box<dyn Iterator<Item = &'a Value> + 'a> = match shops {
            Value::Object(map) => Box::new(map.values()),
            Value::Array(items) => Box::new(items.iter()),
            _ => return None,
        };
        candidates.find(|shop| shop.get("code").and_then(Value::as_str) == Some(self.shop_code))
    }

    fn event_records(&self, event: &Value) -> Vec<ScreeningRecord> {
        let title = event["locale_title"]
            .as_str()
            .map(normalize_whitespace)
            .filter(|t| !t.is_empty())
            .or_else(|| event["name"].as_str().map(normalize_whitespace).filter(|t| !t.is_empty()));
        let Some(title) = title else {
            debug!("{}: event without title", self.slug);
            return Vec::new();
        };

        let film_url = event["url"].as_str().and_then(|href| absolute_url(BASE_URL, href));

        let mut records = Vec::new();
        for performance in event["performances"].as_array().into_iter().flatten() {
            let Some((date, time)) = performance["time"].as_str().and_then(parse_performance_time) else {
                debug!("{}: unreadable performance time for '{}'", self.slug, title);
                continue;
            };

            let mut record = ScreeningRecord::new(self.slug, title.clone(), date, time);
            record.source_url = film_url.clone();
            record.genre = vec!["Cinema".to_string()];
            records.push(record);
        }
        records
    }
}

/// Balanced-brace slice of the object literal assigned to `window.shops`
fn shops_literal(html: &str) -> Option<&str> {
    let start = html.find(SHOPS_MARKER)?;
    let after = &html[start + SHOPS_MARKER.len()..];
    let after = after.trim_start().strip_prefix('=')?;
    let obj_start = after.find('{')?;
    let bytes = &after.as_bytes()[obj_start..];

    let mut depth = 0u32;
    let mut in_string = false;
    let mut escape = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&after[obj_start..obj_start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// `YYYYMMDDHHMMSS`; seconds are optional
fn parse_performance_time(stamp: &str) -> Option<(NaiveDate, String)> {
    let stamp = stamp.trim();
    if stamp.len() < 12 || !stamp.is_char_boundary(12) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&stamp[..8], "%Y%m%d").ok()?;
    let time = normalize_showtime(&format!("{}:{}", &stamp[8..10], &stamp[10..12]))?;
    Some((date, time))
}

impl CinemaSource for MoobySource {
    fn slug(&self) -> &str {
        self.slug
    }

    fn theater_name(&self) -> &str {
        self.theater
    }

    fn listing_url(&self, _month: Month) -> String {
        BASE_URL.to_string()
    }

    fn parse_listing(&self, html: &str, _month: Month) -> Result<ListingPage, ParseError> {
        let literal = shops_literal(html)
            .ok_or_else(|| ParseError::structure(self.slug, "window.shops data not found"))?;
        let shops: Value = serde_json::from_str(literal)
            .map_err(|e| ParseError::structure(self.slug, format!("window.shops is not valid JSON: {}", e)))?;

        let Some(shop) = self.find_shop(&shops) else {
            warn!("{}: shop {} not present in window.shops", self.slug, self.shop_code);
            return Ok(ListingPage::Screenings(Vec::new()));
        };

        let records = shop["events"]
            .as_array()
            .into_iter()
            .flatten()
            .flat_map(|event| self.event_records(event))
            .collect();

        Ok(ListingPage::Screenings(records))
    }
}
