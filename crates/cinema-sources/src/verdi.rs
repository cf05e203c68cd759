use chrono::NaiveDate;
use cinema_models::{normalize_showtime, Month, ScreeningRecord};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use crate::error::ParseError;
use crate::text::{absolute_url, element_text, non_empty, selector};
use crate::traits::{CinemaSource, ListingPage};

const BASE_URL: &str = "https://barcelona.cines-verdi.com";

static FILM_LINK: LazyLock<Selector> = LazyLock::new(|| selector("h2 > a[href]"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static TITLED: LazyLock<Selector> = LazyLock::new(|| selector("[title]"));
// Session buttons carry `title="YYYYMMDD HH:MM"`
static SESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{8})\s+(\d{1,2}:\d{2})$").expect("session regex should compile"));

pub struct VerdiSource;

impl VerdiSource {
    pub const SLUG: &'static str = "verdi";
    pub const THEATER: &'static str = "Verdi Barcelona";
}

impl CinemaSource for VerdiSource {
    fn slug(&self) -> &str {
        Self::SLUG
    }

    fn theater_name(&self) -> &str {
        Self::THEATER
    }

    fn listing_url(&self, _month: Month) -> String {
        format!("{}/cartelera", BASE_URL)
    }

    fn parse_listing(&self, html: &str, _month: Month) -> Result<ListingPage, ParseError> {
        let document = Html::parse_document(html);
        let mut links: Vec<String> = Vec::new();
        for anchor in document.select(&FILM_LINK) {
            let Some(path) = anchor.value().attr("href").map(str::trim) else {
                continue;
            };
            if !path.starts_with('/') || path.contains("cartelera") {
                continue;
            }
            if let Some(url) = absolute_url(BASE_URL, path) {
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
        let Some(title) = document.select(&HEADING).next().map(element_text).and_then(non_empty) else {
            debug!("Verdi: no title on {}", url);
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        let stamps = document
            .select(&TITLED)
            .filter_map(|element| element.value().attr("title"))
            .filter_map(|stamp| SESSION.captures(stamp.trim()));
        for caps in stamps {
            let date = NaiveDate::parse_from_str(&caps[1], "%Y%m%d");
            let time = normalize_showtime(&caps[2]);
            let (Ok(date), Some(time)) = (date, time) else {
                debug!("Verdi: bad session stamp '{} {}' on {}", &caps[1], &caps[2], url);
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
