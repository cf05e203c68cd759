use chrono::NaiveDate;
use cinema_models::{normalize_showtime, Month, ScreeningRecord};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use crate::error::{ParseError, RecordError};
use crate::text::{absolute_url, element_text, non_empty, own_text, selector};
use crate::traits::{CinemaSource, ListingPage};

const BASE_URL: &str = "https://zumzeigcine.coop";
const SESSIONS_URL: &str = "https://zumzeigcine.coop/cinema/sessions/";
const NOT_ON_SALE: &str = "Entrades pròximament a la venda";

static FILM: LazyLock<Selector> = LazyLock::new(|| selector("a.film"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h2.filmtitle"));
static POSTER: LazyLock<Selector> = LazyLock::new(|| selector("img.thumbfilm"));
static AUTHOR: LazyLock<Selector> = LazyLock::new(|| selector("div.autor"));
static CYCLE: LazyLock<Selector> = LazyLock::new(|| selector("div.autor > div.autor"));
static SESSION: LazyLock<Selector> = LazyLock::new(|| selector("div.session"));
static HOUR: LazyLock<Selector> = LazyLock::new(|| selector("span.hour"));
static MORE: LazyLock<Selector> = LazyLock::new(|| selector(".plussesion"));

static SESSION_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\s+(\d{1,2})\.(\d{1,2})\.(\d{2,4})").expect("date regex should compile"));
static SESSION_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?(\d{1,2}:\d{2})\)?$").expect("hour regex should compile"));

/// Zumzeig cooperative cinema.
///
/// The sessions page is an open-ended forward listing, so the requested
/// month is ignored and every upcoming session is returned.
pub struct ZumzeigSource;

impl ZumzeigSource {
    pub const SLUG: &'static str = "zumzeig";
    pub const THEATER: &'static str = "Zumzeig";

    fn parse_card(&self, card: ElementRef<'_>) -> Result<Vec<ScreeningRecord>, RecordError> {
        let heading = card.select(&TITLE).next();
        let title = heading
            .map(own_text)
            .and_then(non_empty)
            .ok_or_else(|| RecordError::new("card without title"))?;

        if element_text(card).contains(NOT_ON_SALE) {
            return Ok(Vec::new());
        }

        let cycle = card.select(&CYCLE).next().map(element_text).and_then(non_empty);
        let director = card.select(&AUTHOR).next().map(own_text).and_then(non_empty);
        let film_type = heading.and_then(|h| {
            h.value()
                .classes()
                .find_map(|class| class.strip_prefix("tipo_"))
                .map(str::to_string)
        });
        let poster = card
            .select(&POSTER)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| absolute_url(BASE_URL, src));
        let film_url = card.value().attr("href").and_then(|href| absolute_url(BASE_URL, href));

        let genre = cycle
            .clone()
            .or(film_type)
            .unwrap_or_else(|| "Film".to_string());

        let mut records = Vec::new();
        for session in card.select(&SESSION) {
            if session.select(&MORE).next().is_some() {
                continue;
            }

            let text = element_text(session);
            let hour = session.select(&HOUR).next().map(element_text).unwrap_or_default();
            let (Some(date), Some(time)) = (parse_session_date(&text), parse_session_time(&hour)) else {
                debug!("Zumzeig: unreadable session for '{}': {}", title, text);
                continue;
            };

            let mut record = ScreeningRecord::new(Self::SLUG, title.clone(), date, time);
            record.raw_director = director.clone();
            record.source_url = film_url.clone();
            record.poster = poster.clone();
            record.cycle = cycle.clone();
            record.genre = vec![genre.clone()];
            records.push(record);
        }

        Ok(records)
    }
}

/// `Dj 6.11.25` style dates. Two-digit years are taken as 20YY.
fn parse_session_date(text: &str) -> Option<NaiveDate> {
    let caps = SESSION_DATE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `(17:30)` as printed in the hour badge
fn parse_session_time(text: &str) -> Option<String> {
    SESSION_HOUR.captures(text.trim()).and_then(|c| normalize_showtime(&c[1]))
}

impl CinemaSource for ZumzeigSource {
    fn slug(&self) -> &str {
        Self::SLUG
    }

    fn theater_name(&self) -> &str {
        Self::THEATER
    }

    fn listing_url(&self, _month: Month) -> String {
        SESSIONS_URL.to_string()
    }

    fn parse_listing(&self, html: &str, _month: Month) -> Result<ListingPage, ParseError> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        let mut cards = 0;

        for card in document.select(&FILM) {
            cards += 1;
            match self.parse_card(card) {
                Ok(mut parsed) => records.append(&mut parsed),
                Err(e) => debug!("Zumzeig: dropped film card: {}", e),
            }
        }

        if cards == 0 {
            return Err(ParseError::structure(Self::SLUG, "no film cards on sessions page"));
        }

        Ok(ListingPage::Screenings(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSIONS: &str = r#"
<section class="films">
<a class="film destacat" href="/pelicula/past-lives/">
  <img class="thumbfilm" src="/wp-content/uploads/past-lives.jpg" />
  <h2 class="filmtitle tipo_estrena">Past Lives <span class="year">2023</span></h2>
  <div class="autor">Celine Song</div>
  <div class="sessions">
    <div class="session">Dj 6.11.25 <span class="hour">(17:30)</span></div>
    <div class="session">Dj 6.11.25 <span class="hour">(20:00)</span></div>
    <div class="session">Dv 7.11.25 <span class="hour">(9:45)</span></div>
    <div class="session"><span class="plussesion">+</span></div>
  </div>
</a>
<a class="film" href="/pelicula/nosferatu/">
  <h2 class="filmtitle tipo_cicle">Nosferatu &amp; Co <span></span></h2>
  <div class="autor"><div class="autor">Cicle Expressionisme</div>F. W. Murnau</div>
  <div class="session">Ds 8.11.25 <span class="hour">(18:00)</span></div>
</a>
<a class="film" href="/pelicula/aviat/">
  <h2 class="filmtitle">Aviat <span></span></h2>
  <p>Entrades pròximament a la venda</p>
</a>
<a class="film" href="/pelicula/sense-titol/">
  <div class="session">Dg 9.11.25 <span class="hour">(18:00)</span></div>
</a>
</section>"#;

    fn month() -> Month {
        Month::new(2025, 11).unwrap()
    }

    #[test]
    fn test_listing_ignores_month() {
        assert_eq!(
            ZumzeigSource.listing_url(Month::new(2030, 1).unwrap()),
            "https://zumzeigcine.coop/cinema/sessions/"
        );
    }

    #[test]
    fn test_parses_cards_into_screenings() {
        let ListingPage::Screenings(records) = ZumzeigSource.parse_listing(SESSIONS, month()).unwrap() else {
            panic!("zumzeig yields screenings directly");
        };

        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.title, "Past Lives");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 11, 6).unwrap());
        assert_eq!(first.time, "17:30");
        assert_eq!(first.raw_director.as_deref(), Some("Celine Song"));
        assert_eq!(first.genre, vec!["estrena"]);
        assert_eq!(
            first.poster.as_deref(),
            Some("https://zumzeigcine.coop/wp-content/uploads/past-lives.jpg")
        );
        assert_eq!(first.source_url.as_deref(), Some("https://zumzeigcine.coop/pelicula/past-lives/"));

        assert_eq!(records[2].time, "09:45");
        assert_eq!(records[2].date, NaiveDate::from_ymd_opt(2025, 11, 7).unwrap());

        let nosferatu = &records[3];
        assert_eq!(nosferatu.title, "Nosferatu & Co");
        assert_eq!(nosferatu.cycle.as_deref(), Some("Cicle Expressionisme"));
        assert_eq!(nosferatu.genre, vec!["Cicle Expressionisme"]);
        assert_eq!(nosferatu.raw_director.as_deref(), Some("F. W. Murnau"));
    }

    #[test]
    fn test_session_date_formats() {
        assert_eq!(parse_session_date("Dj 6.11.25"), NaiveDate::from_ymd_opt(2025, 11, 6));
        assert_eq!(parse_session_date("Dl 1.12.2025"), NaiveDate::from_ymd_opt(2025, 12, 1));
        assert_eq!(parse_session_date("Dl 31.2.25"), None);
        assert_eq!(parse_session_date("demà"), None);
    }

    #[test]
    fn test_session_time_badge() {
        assert_eq!(parse_session_time(" (9:45) ").as_deref(), Some("09:45"));
        assert_eq!(parse_session_time("17:30").as_deref(), Some("17:30"));
        assert_eq!(parse_session_time("(aviat)"), None);
    }

    #[test]
    fn test_page_without_cards_is_structure_error() {
        let err = ZumzeigSource.parse_listing("<html></html>", month()).unwrap_err();
        assert!(matches!(err, ParseError::Structure { .. }));
    }
}
