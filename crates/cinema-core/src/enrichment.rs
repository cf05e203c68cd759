use cinema_config::EnrichmentSettings;
use cinema_models::Movie;
use cinema_sources::text::{absolute_url, selector};
use cinema_sources::tmdb::{poster_url, SearchResult};
use cinema_sources::{MetadataProvider, PageFetcher};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use crate::progress::{EnrichOutcome, EnrichmentProgress};

static PIPE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|.*$").expect("pipe suffix regex should compile"));
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*?\)\s*").expect("parenthetical regex should compile"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-']").expect("punctuation regex should compile"));

/// Poster candidates in priority order, with the attribute holding the URL
static POSTER_CANDIDATES: LazyLock<Vec<(Selector, &'static str)>> = LazyLock::new(|| {
    vec![
        (selector(r#"meta[property="og:image"]"#), "content"),
        (selector(r#"meta[name="twitter:image"]"#), "content"),
        (selector(r#"meta[property="og:image:url"]"#), "content"),
        (selector(r#"img[class*="poster"][src]"#), "src"),
    ]
});

/// Posters already scraped in a batch, keyed by film page URL
type PosterCache = HashMap<String, Option<String>>;

/// Progress is logged every this many movies
const PROGRESS_INTERVAL: usize = 25;

/// Enrichment behaviour fixed at construction
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub delay: Duration,
    pub poster_size: String,
}

impl EnrichmentConfig {
    /// `has_credential` is false when no usable TMDB key exists; enrichment
    /// is then off whatever the settings say.
    pub fn from_settings(settings: &EnrichmentSettings, has_credential: bool) -> Self {
        Self {
            enabled: settings.enabled && has_credential,
            delay: Duration::from_millis(settings.delay_ms),
            poster_size: settings.poster_size.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::from_settings(&EnrichmentSettings::default(), false)
        }
    }
}

/// Title normalized for a metadata search: pipe suffixes and parentheticals
/// removed, punctuation other than apostrophes and hyphens dropped.
pub fn clean_title(title: &str) -> String {
    let title = PIPE_SUFFIX.replace(title, "");
    let title = PARENTHETICAL.replace_all(&title, " ");
    let title = PUNCTUATION.replace_all(&title, " ");
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First poster candidate on a film page, resolved against `page_url`
pub fn scrape_poster(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    POSTER_CANDIDATES
        .iter()
        .filter_map(|(candidate, attr)| {
            document
                .select(candidate)
                .filter_map(|el| el.value().attr(attr))
                .map(str::trim)
                .find(|url| !url.is_empty())
        })
        .find_map(|url| absolute_url(page_url, url))
}

/// Adds TMDB metadata to movies, falling back to a poster scraped from the
/// film's own page. Never fails: every error leaves the movie as it was.
///
/// One instance is shared by every source; batches run one at a time so the
/// pacing delay bounds the request rate across all sources.
pub struct Enricher {
    provider: Option<Arc<dyn MetadataProvider>>,
    fetcher: Arc<dyn PageFetcher>,
    config: EnrichmentConfig,
    batch_lock: Mutex<()>,
}

impl Enricher {
    pub fn new(
        provider: Option<Arc<dyn MetadataProvider>>,
        fetcher: Arc<dyn PageFetcher>,
        config: EnrichmentConfig,
    ) -> Self {
        Self {
            provider,
            fetcher,
            config,
            batch_lock: Mutex::new(()),
        }
    }

    /// TMDB lookups happen only when enabled and a provider is present
    pub fn is_active(&self) -> bool {
        self.config.enabled && self.provider.is_some()
    }

    pub async fn enrich(&self, movie: Movie) -> Movie {
        self.enrich_with_outcome(movie, &mut PosterCache::new()).await.0
    }

    /// Enrich sequentially, pausing `delay` between movies. A film page
    /// shared by several screenings is scraped once per batch.
    pub async fn enrich_all(&self, movies: Vec<Movie>) -> Vec<Movie> {
        if !self.is_active() {
            debug!("TMDB enrichment disabled, only scraping missing posters");
        }

        let _batch = self.batch_lock.lock().await;
        let mut progress = EnrichmentProgress::new(movies.len(), PROGRESS_INTERVAL);
        let mut posters = PosterCache::new();
        let mut enriched = Vec::with_capacity(movies.len());

        for (idx, movie) in movies.into_iter().enumerate() {
            if idx > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }

            let (movie, outcome) = self.enrich_with_outcome(movie, &mut posters).await;
            progress.record(outcome);
            progress.log_progress(idx + 1);
            enriched.push(movie);
        }

        progress.log_summary("Enrichment");
        enriched
    }

    async fn enrich_with_outcome(&self, movie: Movie, posters: &mut PosterCache) -> (Movie, EnrichOutcome) {
        let provider = match &self.provider {
            Some(provider) if self.config.enabled => provider,
            _ => return self.poster_fallback(movie, posters).await,
        };

        let query = clean_title(&movie.title);
        if query.is_empty() {
            return self.poster_fallback(movie, posters).await;
        }

        let hit = match provider.search_movie(&query, None).await {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                debug!("No TMDB match for '{}'", movie.title);
                return self.poster_fallback(movie, posters).await;
            }
            Err(e) => {
                warn!("TMDB search failed for '{}': {}", movie.title, e);
                let (movie, _) = self.poster_fallback(movie, posters).await;
                return (movie, EnrichOutcome::Failed("search"));
            }
        };

        self.apply_match(movie, &**provider, hit, posters).await
    }

    /// Fills the movie from a search hit. Whatever the lookups return is
    /// applied; a failed details or credits call is reported as the outcome.
    async fn apply_match(
        &self,
        mut movie: Movie,
        provider: &dyn MetadataProvider,
        hit: SearchResult,
        posters: &mut PosterCache,
    ) -> (Movie, EnrichOutcome) {
        let (details, credits) = tokio::join!(provider.movie_details(hit.id), provider.movie_credits(hit.id));
        let mut outcome = EnrichOutcome::Enriched;

        match credits {
            Ok(credits) => {
                let directors = credits.directors();
                if !directors.is_empty() {
                    movie.director = Some(directors.join(", "));
                }
            }
            Err(e) => {
                debug!("TMDB credits for {} unavailable: {}", hit.id, e);
                outcome = EnrichOutcome::Failed("credits");
            }
        }

        match details {
            Ok(details) => {
                if let Some(runtime) = details.runtime.filter(|r| *r > 0) {
                    movie.duration = Some(runtime);
                }
            }
            Err(e) => {
                debug!("TMDB details for {} unavailable: {}", hit.id, e);
                outcome = EnrichOutcome::Failed("details");
            }
        }

        if let Some(path) = hit.poster_path.as_deref().filter(|p| !p.is_empty()) {
            movie.poster = Some(poster_url(&self.config.poster_size, path));
        } else if movie.poster.is_none() {
            movie.poster = self.scrape_film_page(&movie, posters).await;
        }

        if let Some(score) = hit.vote_average.filter(|v| *v > 0.0) {
            movie.rating = Some(format!("{}/10", score));
        }

        movie.plot = hit.overview.clone().filter(|o| !o.trim().is_empty());
        movie.tmdb_id = Some(hit.id);
        movie.release_year = hit.release_year();
        movie.original_title = hit
            .original_title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| Some(movie.title.clone()));

        (movie, outcome)
    }

    async fn poster_fallback(&self, mut movie: Movie, posters: &mut PosterCache) -> (Movie, EnrichOutcome) {
        if movie.poster.is_some() {
            return (movie, EnrichOutcome::Unchanged);
        }
        match self.scrape_film_page(&movie, posters).await {
            Some(poster) => {
                movie.poster = Some(poster);
                (movie, EnrichOutcome::PosterOnly)
            }
            None => (movie, EnrichOutcome::Unchanged),
        }
    }

    async fn scrape_film_page(&self, movie: &Movie, posters: &mut PosterCache) -> Option<String> {
        let url = movie.film_url.as_deref()?;
        if let Some(cached) = posters.get(url) {
            return cached.clone();
        }

        let poster = match self.fetcher.fetch(url).await {
            Ok(html) => scrape_poster(&html, url),
            Err(e) => {
                debug!("Poster scrape failed for '{}': {}", movie.title, e);
                None
            }
        };
        posters.insert(url.to_string(), poster.clone());
        poster
    }
}
