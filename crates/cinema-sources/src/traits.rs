use cinema_models::{Month, ScreeningRecord};
use crate::error::ParseError;

/// What a listing page yields
#[derive(Debug, Clone, PartialEq)]
pub enum ListingPage {
    /// The listing already carries every screening
    Screenings(Vec<ScreeningRecord>),
    /// Per-film pages must be fetched and parsed with `parse_detail`
    DetailLinks(Vec<String>),
}

impl ListingPage {
    pub fn len(&self) -> usize {
        match self {
            ListingPage::Screenings(records) => records.len(),
            ListingPage::DetailLinks(links) => links.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One theater website family.
///
/// Implementations only turn page text into screenings. Fetching, pacing
/// between detail pages, merging and caching are done by the caller.
pub trait CinemaSource: Send + Sync {
    /// Cache key and `source` tag of every movie this theater produces
    fn slug(&self) -> &str;

    fn theater_name(&self) -> &str;

    /// Page to fetch for `month`. Sources without month addressing ignore it.
    fn listing_url(&self, month: Month) -> String;

    /// Parse the listing page. `month` supplies year/month for sources whose
    /// markup only prints the day number.
    fn parse_listing(&self, html: &str, month: Month) -> Result<ListingPage, ParseError>;

    /// Parse one film page returned as a `ListingPage::DetailLinks` entry
    fn parse_detail(&self, _html: &str, _url: &str) -> Result<Vec<ScreeningRecord>, ParseError> {
        Ok(Vec::new())
    }
}
