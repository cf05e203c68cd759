use chrono::NaiveDate;
use cinema_models::{normalize_showtime, Month, ScreeningRecord};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;
use crate::error::ParseError;
use crate::text::{absolute_url, element_text, non_empty, normalize_whitespace, selector};
use crate::traits::{CinemaSource, ListingPage};

const BASE_URL: &str = "https://www.cinesrenoir.com";
const LISTING_URL: &str = "https://www.cinesrenoir.com/cine/renoir-floridablanca/cartelera/";

const DETAIL_PREFIX: &str = "/pelicula/";

static DETAIL_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href^="/pelicula/"]"#));
static JSON_LD: LazyLock<Selector> = LazyLock::new(|| selector(r#"script[type="application/ld+json"]"#));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));

/// Renoir Floridablanca.
///
/// The listing links to one page per film; showtimes live in the JSON-LD
/// event blocks of those pages, mixed with the other Renoir venues.
pub struct RenoirSource;

impl RenoirSource {
    pub const SLUG: &'static str = "renoir";
    pub const THEATER: &'static str = "Renoir Floridablanca";
}

/// Every JSON-LD object on the page. Arrays and `@graph` containers are flattened.
fn json_ld_objects(document: &Html) -> Vec<Value> {
    let mut objects = Vec::new();
    for script in document.select(&JSON_LD) {
        let body: String = script.text().collect();
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => flatten_into(value, &mut objects),
            Err(e) => debug!("Renoir: ignoring malformed JSON-LD block: {}", e),
        }
    }
    objects
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_into(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

fn is_event_here(object: &Value) -> bool {
    let is_event = match &object["@type"] {
        Value::String(t) => t == "Event" || t == "ScreeningEvent",
        Value::Array(types) => types.iter().any(|t| t == "Event" || t == "ScreeningEvent"),
        _ => false,
    };
    is_event && object["location"]["name"].as_str() == Some(RenoirSource::THEATER)
}

/// `2025-11-21T16:00`, optionally with seconds and an offset
fn split_start_date(start: &str) -> Option<(NaiveDate, String)> {
    let (date, time) = start.split_once('T')?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = normalize_showtime(time.get(..5)?)?;
    Some((date, time))
}

impl CinemaSource for RenoirSource {
    fn slug(&self) -> &str {
        Self::SLUG
    }

    fn theater_name(&self) -> &str {
        Self::THEATER
    }

    fn listing_url(&self, _month: Month) -> String {
        LISTING_URL.to_string()
    }

    fn parse_listing(&self, html: &str, _month: Month) -> Result<ListingPage, ParseError> {
        let document = Html::parse_document(html);
        let mut links: Vec<String> = Vec::new();
        for anchor in document.select(&DETAIL_LINK) {
            // `/pelicula/<slug>/` only
            let Some(href) = anchor.value().attr("href").map(str::trim) else {
                continue;
            };
            if href.len() <= DETAIL_PREFIX.len() || !href.ends_with('/') {
                continue;
            }
            if let Some(url) = absolute_url(BASE_URL, href) {
                if !links.contains(&url) {
                    links.push(url);
                }
            }
        }

        if links.is_empty() {
            return Err(ParseError::structure(Self::SLUG, "no film links on listing page"));
        }

        Ok(ListingPage::DetailLinks(links))
    }

    fn parse_detail(&self, html: &str, url: &str) -> Result<Vec<ScreeningRecord>, ParseError> {
        let document = Html::parse_document(html);
        let events: Vec<Value> = json_ld_objects(&document).into_iter().filter(is_event_here).collect();

        let title = events
            .iter()
            .rev()
            .filter_map(|e| e["name"].as_str())
            .map(normalize_whitespace)
            .find(|name| !name.is_empty())
            .or_else(|| document.select(&HEADING).next().map(element_text).and_then(non_empty));

        let Some(title) = title else {
            if !events.is_empty() {
                debug!("Renoir: {} events without a title at {}", events.len(), url);
            }
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for event in &events {
            let Some((date, time)) = event["startDate"].as_str().and_then(split_start_date) else {
                debug!("Renoir: event without usable startDate for '{}'", title);
                continue;
            };

            let mut record = ScreeningRecord::new(Self::SLUG, title.clone(), date, time);
            record.source_url = Some(url.to_string());
            record.genre = vec!["Cinema".to_string()];
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
<ul class="cartelera">
  <li><a href="/pelicula/dune-parte-dos/"><img src="/img/dune.jpg"></a>
      <a href="/pelicula/dune-parte-dos/">Dune: Parte dos</a></li>
  <li><a href="/pelicula/perfect-days/">Perfect Days</a></li>
  <li><a href="/cine/renoir-floridablanca/">Cine</a></li>
</ul>"#;

    const DETAIL: &str = r#"
<html><head>
<script type="application/ld+json">
[
  {"@type": "Event", "name": "Perfect Days", "startDate": "2025-11-21T16:00",
   "location": {"@type": "Place", "name": "Renoir Floridablanca"}},
  {"@type": "Event", "name": "Perfect Days", "startDate": "2025-11-21T18:15:00",
   "location": {"@type": "Place", "name": "Renoir Floridablanca"}},
  {"@type": "Event", "name": "Perfect Days", "startDate": "2025-11-21T19:00",
   "location": {"@type": "Place", "name": "Renoir Les Corts"}}
]
</script>
<script type="application/ld+json">{"@type": "Event", "name": "Perfect Days",
 "startDate": "2025-11-22T20:30", "location": {"name": "Renoir Floridablanca"}}</script>
<script type="application/ld+json">{ not json </script>
</head><body><h1>Perfect <em>Days</em></h1></body></html>"#;

    #[test]
    fn test_listing_yields_unique_detail_links() {
        let page = RenoirSource.parse_listing(LISTING, Month::current()).unwrap();
        assert_eq!(
            page,
            ListingPage::DetailLinks(vec![
                "https://www.cinesrenoir.com/pelicula/dune-parte-dos/".to_string(),
                "https://www.cinesrenoir.com/pelicula/perfect-days/".to_string(),
            ])
        );
    }

    #[test]
    fn test_listing_without_links_is_structure_error() {
        let err = RenoirSource.parse_listing("<html></html>", Month::current()).unwrap_err();
        assert!(matches!(err, ParseError::Structure { .. }));
    }

    #[test]
    fn test_detail_keeps_only_floridablanca_events() {
        let url = "https://www.cinesrenoir.com/pelicula/perfect-days/";
        let records = RenoirSource.parse_detail(DETAIL, url).unwrap();

        let summary: Vec<(String, String)> = records
            .iter()
            .map(|r| (r.date.to_string(), r.time.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("2025-11-21".to_string(), "16:00".to_string()),
                ("2025-11-21".to_string(), "18:15".to_string()),
                ("2025-11-22".to_string(), "20:30".to_string()),
            ]
        );
        assert!(records.iter().all(|r| r.title == "Perfect Days"));
        assert!(records.iter().all(|r| r.source_url.as_deref() == Some(url)));
        assert_eq!(records[0].genre, vec!["Cinema"]);
    }

    #[test]
    fn test_detail_title_falls_back_to_heading() {
        let html = r#"<script type="application/ld+json">{"@graph": [{"@type": "Event",
            "startDate": "2025-11-23T17:00", "location": {"name": "Renoir Floridablanca"}}]}</script>
            <h1 class="titulo">La <b>quimera</b></h1>"#;
        let records = RenoirSource.parse_detail(html, "https://www.cinesrenoir.com/pelicula/la-quimera/").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "La quimera");
    }

    #[test]
    fn test_detail_without_events_is_empty() {
        let records = RenoirSource.parse_detail("<h1>Próximamente</h1>", "https://x").unwrap();
        assert!(records.is_empty());
    }
}
