use chrono::NaiveDate;
use cinema_models::{normalize_showtime, Month, ScreeningRecord};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use crate::error::{ParseError, RecordError};
use crate::text::{absolute_url, element_text, non_empty, normalize_whitespace, selector};
use crate::traits::{CinemaSource, ListingPage};

const BASE_URL: &str = "https://www.filmoteca.cat";
const AGENDA_PATH: &str = "/web/ca/view-agenda-mensual";

// Day headers and their entry lists, in document order
static DAY_OR_LIST: LazyLock<Selector> = LazyLock::new(|| selector("h2, div.column-list"));
static DAY_NUMBER: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static CYCLE: LazyLock<Selector> = LazyLock::new(|| selector("span a"));
static GUESTS: LazyLock<Selector> = LazyLock::new(|| selector("a[onclick]"));

static TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{1,2}:\d{2})").expect("time regex should compile"));
static ALERT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"alert\("([^"]*)"\)"#).expect("alert regex should compile"));

/// Filmoteca de Catalunya monthly agenda
pub struct FilmotecaSource;

impl FilmotecaSource {
    pub const SLUG: &'static str = "filmoteca";
    pub const THEATER: &'static str = "Filmoteca de Catalunya";

    fn parse_item(&self, item: ElementRef<'_>, date: NaiveDate) -> Result<ScreeningRecord, RecordError> {
        let time = TIME
            .captures(&element_text(item))
            .and_then(|c| normalize_showtime(&c[1]))
            .ok_or_else(|| RecordError::new("no showtime"))?;

        let link = title_link(item).ok_or_else(|| RecordError::new("no title link"))?;
        let title = element_text(link);
        if title.is_empty() {
            return Err(RecordError::new("empty title"));
        }

        let mut record = ScreeningRecord::new(Self::SLUG, title, date, time);
        record.source_url = link.value().attr("href").and_then(|href| absolute_url(BASE_URL, href));
        record.alt_title = alt_title(link);
        record.cycle = item.select(&CYCLE).next().map(element_text).and_then(non_empty);
        record.guests = item
            .select(&GUESTS)
            .filter_map(|a| a.value().attr("onclick"))
            .find_map(|onclick| ALERT.captures(onclick).map(|c| normalize_whitespace(&c[1])))
            .and_then(non_empty);
        record.genre = vec![record.cycle.clone().unwrap_or_else(|| "Film".to_string())];

        Ok(record)
    }
}

/// The entry's own `<a href>`; cycle links sit inside a `<span>`
fn title_link(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    item.children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "a" && child.value().attr("href").is_some())
}

/// Text between the title link and the cycle `<span>`
fn alt_title(link: ElementRef<'_>) -> Option<String> {
    let mut text = String::new();
    for sibling in link.next_siblings() {
        match sibling.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "span" => return non_empty(normalize_whitespace(&text)),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(sibling) {
                    text.push_str(&element_text(element));
                }
            }
            _ => {}
        }
    }
    None
}

fn day_number(header: ElementRef<'_>) -> Option<u32> {
    header.select(&DAY_NUMBER).next()?.text().collect::<String>().trim().parse().ok()
}

impl CinemaSource for FilmotecaSource {
    fn slug(&self) -> &str {
        Self::SLUG
    }

    fn theater_name(&self) -> &str {
        Self::THEATER
    }

    fn listing_url(&self, month: Month) -> String {
        format!("{}{}?m={}", BASE_URL, AGENDA_PATH, month)
    }

    fn parse_listing(&self, html: &str, month: Month) -> Result<ListingPage, ParseError> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        let mut sections = 0;
        // Entries belong to the closest preceding day header
        let mut current: Option<NaiveDate> = None;

        for element in document.root_element().select(&DAY_OR_LIST) {
            if element.value().name() == "h2" {
                let Some(day) = day_number(element) else {
                    current = None;
                    continue;
                };
                sections += 1;
                current = month.day(day);
                if current.is_none() {
                    debug!("Filmoteca: skipping day {} not in {}", day, month);
                }
                continue;
            }

            let Some(date) = current.take() else {
                continue;
            };
            for item in element.select(&ITEM) {
                match self.parse_item(item, date) {
                    Ok(record) => records.push(record),
                    Err(e) => debug!("Filmoteca: dropped entry on {}: {}", date, e),
                }
            }
        }

        if sections == 0 {
            return Err(ParseError::structure(Self::SLUG, "no day sections in agenda"));
        }

        Ok(ListingPage::Screenings(records))
    }
}
