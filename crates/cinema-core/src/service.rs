use chrono::NaiveDate;
use cinema_models::{Month, Movie, ScreeningRecord};
use cinema_sources::{CinemaSource, ListingPage, PageFetcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use crate::cache::{SnapshotStore, StoreStats};
use crate::enrichment::Enricher;
use crate::error::{Result, ServiceError};
use crate::grouping::group_screenings;

/// Orchestrates one theater: cache lookup, fetch, parse, merge, month
/// filter, enrichment and persistence.
pub struct SourceService {
    source: Arc<dyn CinemaSource>,
    fetcher: Arc<dyn PageFetcher>,
    store: SnapshotStore,
    enricher: Arc<Enricher>,
    detail_delay: Duration,
}

impl SourceService {
    pub fn new(
        source: Arc<dyn CinemaSource>,
        fetcher: Arc<dyn PageFetcher>,
        store: SnapshotStore,
        enricher: Arc<Enricher>,
        detail_delay: Duration,
    ) -> Self {
        Self {
            source,
            fetcher,
            store,
            enricher,
            detail_delay,
        }
    }

    pub fn slug(&self) -> &str {
        self.source.slug()
    }

    pub fn theater_name(&self) -> &str {
        self.source.theater_name()
    }

    #[instrument(skip(self), fields(source = %self.source.slug()))]
    pub async fn get_movies_for_month(&self, month: Month, force_refresh: bool) -> Result<Vec<Movie>> {
        if !force_refresh {
            if let Some(snapshot) = self.store.get(month).map_err(ServiceError::Cache)? {
                return Ok(snapshot.movies);
            }
        }

        let records = match self.scrape(month).await {
            Ok(records) => records,
            Err(e) => return self.stale_or(month, e),
        };

        let scraped = records.len();
        let movies: Vec<Movie> = group_screenings(records, self.source.theater_name())
            .into_iter()
            .filter(|movie| month.contains(movie.date))
            .collect();
        info!(
            "{}: {} screenings merged into {} movies for {}",
            self.source.slug(),
            scraped,
            movies.len(),
            month
        );

        let movies = self.enricher.enrich_all(movies).await;

        if let Err(e) = self.store.save(month, movies.clone(), self.source.theater_name()) {
            warn!("Failed to save {} snapshot for {}: {}", self.source.slug(), month, e);
        }

        Ok(movies)
    }

    /// Month query for the date's month, narrowed to that date
    pub async fn get_movies_for_date(&self, date: NaiveDate, force_refresh: bool) -> Result<Vec<Movie>> {
        let movies = self.get_movies_for_month(Month::of(date), force_refresh).await?;
        Ok(movies.into_iter().filter(|movie| movie.date == date).collect())
    }

    /// Every cached movie of this source; never fetches
    pub fn get_all_movies(&self) -> Result<Vec<Movie>> {
        self.store.all_movies().map_err(ServiceError::Cache)
    }

    pub fn clear_cache(&self) -> Result<usize> {
        self.store.clear().map_err(ServiceError::Cache)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats().map_err(ServiceError::Cache)
    }

    /// Serve the persisted snapshot after a failed refresh, if there is one
    fn stale_or(&self, month: Month, error: ServiceError) -> Result<Vec<Movie>> {
        match self.store.get(month) {
            Ok(Some(snapshot)) => {
                warn!(
                    "{}: refresh for {} failed ({}), serving snapshot from {}",
                    self.source.slug(),
                    month,
                    error,
                    snapshot.last_updated.to_rfc3339()
                );
                Ok(snapshot.movies)
            }
            Ok(None) => Err(error),
            Err(cache_err) => {
                warn!("{}: snapshot unreadable during fallback: {}", self.source.slug(), cache_err);
                Err(error)
            }
        }
    }

    async fn scrape(&self, month: Month) -> Result<Vec<ScreeningRecord>> {
        let url = self.source.listing_url(month);
        let listing = self.fetcher.fetch(&url).await?;

        match self.source.parse_listing(&listing, month)? {
            ListingPage::Screenings(records) => Ok(records),
            ListingPage::DetailLinks(links) => Ok(self.scrape_details(&links).await),
        }
    }

    /// Detail pages are fetched one at a time; a page that fails is skipped
    async fn scrape_details(&self, links: &[String]) -> Vec<ScreeningRecord> {
        debug!("{}: {} detail pages to read", self.source.slug(), links.len());

        let mut records = Vec::new();
        let mut skipped = 0;
        for (idx, link) in links.iter().enumerate() {
            if idx > 0 && !self.detail_delay.is_zero() {
                tokio::time::sleep(self.detail_delay).await;
            }

            let page = match self.fetcher.fetch(link).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("{}: skipping detail page: {}", self.source.slug(), e);
                    skipped += 1;
                    continue;
                }
            };

            match self.source.parse_detail(&page, link) {
                Ok(mut parsed) => records.append(&mut parsed),
                Err(e) => {
                    warn!("{}: skipping detail page {}: {}", self.source.slug(), link, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            info!("{}: {} of {} detail pages skipped", self.source.slug(), skipped, links.len());
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::EnrichmentConfig;
    use crate::testing::{date, LineSource, LinkedSource, StubFetcher, LINKED_LISTING_URL, LINE_SOURCE_URL};
    use tempfile::TempDir;

    const LISTING: &str = "\
Past Lives|2025-11-06|20:00
Past Lives|2025-11-06|17:30
Dune|2025-11-07|21:00
Next Month|2025-12-01|18:00
";

    fn november() -> Month {
        "2025-11".parse().unwrap()
    }

    fn line_url() -> String {
        format!("{}/line", LINE_SOURCE_URL)
    }

    /// The enricher scrapes posters through its own fetcher so `fetcher`
    /// only records listing and detail requests.
    fn service(
        dir: &TempDir,
        source: Arc<dyn CinemaSource>,
        fetcher: Arc<StubFetcher>,
        detail_delay: Duration,
    ) -> SourceService {
        let store = SnapshotStore::new(dir.path(), source.slug()).unwrap();
        let enricher = Arc::new(Enricher::new(None, Arc::new(StubFetcher::new()), EnrichmentConfig::disabled()));
        SourceService::new(source, fetcher, store, enricher, detail_delay)
    }

    fn line_service(dir: &TempDir, fetcher: Arc<StubFetcher>) -> SourceService {
        service(
            dir,
            Arc::new(LineSource {
                slug: "line",
                theater: "Line Cinema",
            }),
            fetcher,
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_miss_fetches_merges_filters_and_persists() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().page(&line_url(), LISTING));
        let service = line_service(&dir, fetcher.clone());

        let movies = service.get_movies_for_month(november(), false).await.unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Past Lives");
        assert_eq!(movies[0].showtimes.iter().cloned().collect::<Vec<_>>(), vec!["17:30", "20:00"]);
        assert_eq!(movies[0].theater, "Line Cinema");
        assert_eq!(movies[1].title, "Dune");

        let snapshot = SnapshotStore::new(dir.path(), "line").unwrap().get(november()).unwrap().unwrap();
        assert_eq!(snapshot.movies, movies);
        assert_eq!(snapshot.theater, "Line Cinema");
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_fetch() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().page(&line_url(), LISTING));
        let service = line_service(&dir, fetcher.clone());

        let first = service.get_movies_for_month(november(), false).await.unwrap();
        fetcher.set_page(&line_url(), "Changed|2025-11-10|10:00");
        let second = service.get_movies_for_month(november(), false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().page(&line_url(), LISTING));
        let service = line_service(&dir, fetcher.clone());

        service.get_movies_for_month(november(), false).await.unwrap();
        fetcher.set_page(&line_url(), "Changed|2025-11-10|10:00");
        let refreshed = service.get_movies_for_month(november(), true).await.unwrap();

        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].title, "Changed");
        assert_eq!(service.get_all_movies().unwrap(), refreshed);
    }

    #[tokio::test]
    async fn test_fetch_failure_serves_stale_snapshot() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().page(&line_url(), LISTING));
        let service = line_service(&dir, fetcher.clone());

        let cached = service.get_movies_for_month(november(), false).await.unwrap();
        fetcher.fail(&line_url());

        let stale = service.get_movies_for_month(november(), true).await.unwrap();
        assert_eq!(stale, cached);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_snapshot_is_hard_error() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.fail(&line_url());
        let service = line_service(&dir, fetcher);

        let err = service.get_movies_for_month(november(), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_structure_error_falls_back_or_propagates() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().page(&line_url(), "   "));
        let service = line_service(&dir, fetcher.clone());

        let err = service.get_movies_for_month(november(), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));

        fetcher.set_page(&line_url(), LISTING);
        let cached = service.get_movies_for_month(november(), true).await.unwrap();
        fetcher.set_page(&line_url(), "");
        assert_eq!(service.get_movies_for_month(november(), true).await.unwrap(), cached);
    }

    #[tokio::test]
    async fn test_date_query_is_subset_of_month() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().page(&line_url(), LISTING));
        let service = line_service(&dir, fetcher);

        let day = service.get_movies_for_date(date("2025-11-07"), false).await.unwrap();
        let month = service.get_movies_for_month(november(), false).await.unwrap();

        let expected: Vec<Movie> = month.into_iter().filter(|m| m.date == date("2025-11-07")).collect();
        assert_eq!(day, expected);
        assert_eq!(day.len(), 1);
    }

    #[tokio::test]
    async fn test_detail_pages_tolerate_failures() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            StubFetcher::new()
                .page(
                    LINKED_LISTING_URL,
                    "https://linked.example/a\nhttps://linked.example/missing\nhttps://linked.example/b\n",
                )
                .page("https://linked.example/a", "Anora|2025-11-21|16:00\nAnora|2025-11-22|18:00")
                .page("https://linked.example/b", "Anora|2025-11-21|22:10\nFlow|2025-11-21|17:00"),
        );
        let service = service(&dir, Arc::new(LinkedSource), fetcher.clone(), Duration::ZERO);

        let movies = service.get_movies_for_month(november(), false).await.unwrap();

        let summary: Vec<(String, usize)> = movies.iter().map(|m| (m.title.clone(), m.showtimes.len())).collect();
        assert_eq!(
            summary,
            vec![("Anora".to_string(), 2), ("Anora".to_string(), 1), ("Flow".to_string(), 1)]
        );
        assert_eq!(movies[0].film_url.as_deref(), Some("https://linked.example/a"));
        assert_eq!(
            fetcher.requests(),
            vec![
                LINKED_LISTING_URL,
                "https://linked.example/a",
                "https://linked.example/missing",
                "https://linked.example/b",
            ]
        );
    }

    #[tokio::test]
    async fn test_unreadable_detail_page_is_skipped() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            StubFetcher::new()
                .page(LINKED_LISTING_URL, "https://linked.example/a\nhttps://linked.example/broken\n")
                .page("https://linked.example/a", "Flow|2025-11-21|17:00")
                .page("https://linked.example/broken", "broken"),
        );
        let service = service(&dir, Arc::new(LinkedSource), fetcher.clone(), Duration::ZERO);

        let movies = service.get_movies_for_month(november(), false).await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Flow");
        assert_eq!(fetcher.requests().len(), 3);
        assert_eq!(service.get_all_movies().unwrap(), movies);
    }

    #[tokio::test]
    async fn test_detail_pages_are_paced() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            StubFetcher::new()
                .page(
                    LINKED_LISTING_URL,
                    "https://linked.example/a\nhttps://linked.example/b\nhttps://linked.example/c\n",
                )
                .page("https://linked.example/a", "Anora|2025-11-21|16:00")
                .page("https://linked.example/b", "Flow|2025-11-21|17:00")
                .page("https://linked.example/c", "Dune|2025-11-22|21:00"),
        );
        let service = service(&dir, Arc::new(LinkedSource), fetcher, Duration::from_millis(30));

        let start = std::time::Instant::now();
        let movies = service.get_movies_for_month(november(), false).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(60));
        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Anora", "Flow", "Dune"]);
    }

    #[tokio::test]
    async fn test_persist_failure_still_returns_movies() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().page(&line_url(), LISTING));
        let store_dir = dir.path().join("snapshots");
        let store = SnapshotStore::new(&store_dir, "line").unwrap();
        let enricher = Arc::new(Enricher::new(None, fetcher.clone(), EnrichmentConfig::disabled()));
        let service = SourceService::new(
            Arc::new(LineSource {
                slug: "line",
                theater: "Line Cinema",
            }),
            fetcher,
            store,
            enricher,
            Duration::ZERO,
        );

        std::fs::remove_dir_all(&store_dir).unwrap();
        std::fs::write(&store_dir, "not a directory").unwrap();

        let movies = service.get_movies_for_month(november(), false).await.unwrap();
        assert_eq!(movies.len(), 2);
    }
}
