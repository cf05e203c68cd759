//! In-memory collaborators shared by the unit tests of this crate.

use async_trait::async_trait;
use chrono::NaiveDate;
use cinema_models::{Month, Movie, ScreeningRecord};
use cinema_sources::tmdb::{Credits, CrewMember, MovieDetails, SearchResult};
use cinema_sources::{CinemaSource, FetchError, ListingPage, MetadataProvider, PageFetcher, ParseError, TmdbError};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serves canned pages; unknown URLs answer 404
#[derive(Default)]
pub struct StubFetcher {
    pages: Mutex<HashMap<String, Result<String, FetchError>>>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.set_page(url, body);
        self
    }

    pub fn set_page(&self, url: &str, body: &str) {
        self.pages.lock().unwrap().insert(url.to_string(), Ok(body.to_string()));
    }

    pub fn fail(&self, url: &str) {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            Err(FetchError::Request {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        );
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            })
    }
}

/// Knows a fixed set of titles
#[derive(Default)]
pub struct StubProvider {
    hits: HashMap<String, (SearchResult, MovieDetails, Credits)>,
    fail_search: bool,
    fail_details: bool,
    fail_credits: bool,
    pub searches: Mutex<Vec<String>>,
    pub detail_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_search: true,
            ..Self::default()
        }
    }

    /// Searches still match; details lookups answer 500
    pub fn without_details(mut self) -> Self {
        self.fail_details = true;
        self
    }

    /// Searches still match; credits lookups answer 500
    pub fn without_credits(mut self) -> Self {
        self.fail_credits = true;
        self
    }

    pub fn with_movie(mut self, query: &str, hit: SearchResult, runtime: Option<u32>, directors: &[&str]) -> Self {
        let details = MovieDetails {
            id: hit.id,
            runtime,
            genres: Vec::new(),
        };
        let credits = Credits {
            crew: directors
                .iter()
                .map(|name| CrewMember {
                    name: name.to_string(),
                    job: "Director".to_string(),
                })
                .collect(),
        };
        self.hits.insert(query.to_string(), (hit, details, credits));
        self
    }

    fn by_id(&self, id: u64) -> Option<&(SearchResult, MovieDetails, Credits)> {
        self.hits.values().find(|(hit, _, _)| hit.id == id)
    }
}

#[async_trait]
impl MetadataProvider for StubProvider {
    async fn search_movie(&self, title: &str, _year: Option<i32>) -> Result<Option<SearchResult>, TmdbError> {
        self.searches.lock().unwrap().push(title.to_string());
        if self.fail_search {
            return Err(TmdbError::Api {
                status: 401,
                message: "Invalid API key".to_string(),
            });
        }
        Ok(self.hits.get(title).map(|(hit, _, _)| hit.clone()))
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, TmdbError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_details {
            return Err(server_error());
        }
        self.by_id(id).map(|(_, details, _)| details.clone()).ok_or(TmdbError::Api {
            status: 404,
            message: "not found".to_string(),
        })
    }

    async fn movie_credits(&self, id: u64) -> Result<Credits, TmdbError> {
        if self.fail_credits {
            return Err(server_error());
        }
        self.by_id(id).map(|(_, _, credits)| credits.clone()).ok_or(TmdbError::Api {
            status: 404,
            message: "not found".to_string(),
        })
    }
}

fn server_error() -> TmdbError {
    TmdbError::Api {
        status: 500,
        message: "internal error".to_string(),
    }
}

/// Single-page source whose listing is `title|YYYY-MM-DD|HH:MM` lines.
/// An empty page is a structure error.
pub struct LineSource {
    pub slug: &'static str,
    pub theater: &'static str,
}

pub const LINE_SOURCE_URL: &str = "https://line.example/listing";

impl CinemaSource for LineSource {
    fn slug(&self) -> &str {
        self.slug
    }

    fn theater_name(&self) -> &str {
        self.theater
    }

    fn listing_url(&self, _month: Month) -> String {
        format!("{}/{}", LINE_SOURCE_URL, self.slug)
    }

    fn parse_listing(&self, html: &str, _month: Month) -> Result<ListingPage, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::structure(self.slug, "empty listing"));
        }
        Ok(ListingPage::Screenings(parse_lines(self.slug, html)))
    }
}

/// Two-phase source: the listing is one detail URL per line, each detail
/// page holds `title|YYYY-MM-DD|HH:MM` lines. A detail page reading
/// `broken` is a structure error.
pub struct LinkedSource;

pub const LINKED_LISTING_URL: &str = "https://linked.example/cartelera";

impl CinemaSource for LinkedSource {
    fn slug(&self) -> &str {
        "linked"
    }

    fn theater_name(&self) -> &str {
        "Linked Cinema"
    }

    fn listing_url(&self, _month: Month) -> String {
        LINKED_LISTING_URL.to_string()
    }

    fn parse_listing(&self, html: &str, _month: Month) -> Result<ListingPage, ParseError> {
        let links: Vec<String> = html.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect();
        if links.is_empty() {
            return Err(ParseError::structure("linked", "no links"));
        }
        Ok(ListingPage::DetailLinks(links))
    }

    fn parse_detail(&self, html: &str, url: &str) -> Result<Vec<ScreeningRecord>, ParseError> {
        if html.trim() == "broken" {
            return Err(ParseError::structure("linked", format!("unreadable detail page {}", url)));
        }
        let mut records = parse_lines("linked", html);
        for record in &mut records {
            record.source_url = Some(url.to_string());
        }
        Ok(records)
    }
}

fn parse_lines(slug: &str, text: &str) -> Vec<ScreeningRecord> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.trim().split('|');
            let title = parts.next()?;
            let date = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
            let time = parts.next()?;
            Some(ScreeningRecord::new(slug, title, date, time))
        })
        .collect()
}

pub fn sample_movie(title: &str, date: NaiveDate, showtimes: &[&str]) -> Movie {
    Movie {
        id: format!("test_{}_{}", date, title.to_lowercase()),
        title: title.to_string(),
        alt_title: None,
        director: None,
        duration: None,
        genre: vec!["Film".to_string()],
        rating: None,
        poster: None,
        theater: "Test".to_string(),
        showtimes: showtimes.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        date,
        film_url: None,
        source: "test".to_string(),
        plot: None,
        tmdb_id: None,
        original_title: None,
        release_year: None,
        cycle: None,
        guests: None,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
