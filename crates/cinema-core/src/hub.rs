use anyhow::Context;
use chrono::NaiveDate;
use cinema_config::{Config, CredentialStore, PathManager};
use cinema_models::{Month, Movie};
use cinema_sources::{HttpFetcher, MetadataProvider, PageFetcher, SourceCatalog, TmdbClient};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use crate::cache::{SnapshotStore, StoreStats};
use crate::enrichment::{EnrichmentConfig, Enricher};
use crate::error::{Result, ServiceError};
use crate::service::SourceService;

/// A source that produced no result for a combined query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Combined movies of every source that answered, sorted
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateResult {
    pub movies: Vec<Movie>,
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    Date(NaiveDate),
    Month(Month),
    CurrentMonth,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub total_months: usize,
    pub total_movies: usize,
    pub sources: Vec<StoreStats>,
}

/// Order by date, then earliest showtime (`00:00` when there is none).
/// Stable, so ties keep source order.
pub fn sort_movies(movies: &mut [Movie]) {
    movies.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.earliest_showtime().cmp(b.earliest_showtime()))
    });
}

/// Fans queries out to every configured source
pub struct CinemaHub {
    services: Vec<SourceService>,
}

impl CinemaHub {
    pub fn new(services: Vec<SourceService>) -> Self {
        Self { services }
    }

    /// Build the enabled sources with a shared HTTP client and enricher
    pub fn from_config(config: &Config, credentials: &CredentialStore, paths: &PathManager) -> anyhow::Result<Self> {
        config.validate()?;

        let http = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;
        let api_key = credentials.tmdb_api_key();
        let provider: Option<Arc<dyn MetadataProvider>> = match (&api_key, config.enrichment.enabled) {
            (Some(key), true) => {
                let client = TmdbClient::new(http.client().clone(), key.clone())
                    .with_language(config.enrichment.language.clone());
                Some(Arc::new(client) as Arc<dyn MetadataProvider>)
            }
            (None, true) => {
                warn!("TMDB API key not configured; movie metadata will not be fetched");
                None
            }
            _ => None,
        };

        let fetcher: Arc<dyn PageFetcher> = Arc::new(http);
        let enricher = Arc::new(Enricher::new(
            provider,
            fetcher.clone(),
            EnrichmentConfig::from_settings(&config.enrichment, api_key.is_some()),
        ));

        let snapshot_dir = paths.snapshot_dir();
        let detail_delay = Duration::from_millis(config.fetch.detail_delay_ms);
        let mut services = Vec::new();
        for source in SourceCatalog::new().create_enabled(config)? {
            let store = SnapshotStore::new(&snapshot_dir, source.slug())?;
            services.push(SourceService::new(source, fetcher.clone(), store, enricher.clone(), detail_delay));
        }

        info!(
            "Configured {} sources, enrichment {}",
            services.len(),
            if enricher.is_active() { "on" } else { "off" }
        );
        Ok(Self::new(services))
    }

    pub fn source_slugs(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.slug()).collect()
    }

    #[instrument(skip(self))]
    pub async fn get_movies_for_month(&self, month: Month, force_refresh: bool) -> Result<AggregateResult> {
        let results = join_all(
            self.services
                .iter()
                .map(|service| service.get_movies_for_month(month, force_refresh)),
        )
        .await;
        self.combine(results)
    }

    #[instrument(skip(self))]
    pub async fn get_movies_for_date(&self, date: NaiveDate, force_refresh: bool) -> Result<AggregateResult> {
        let results = join_all(
            self.services
                .iter()
                .map(|service| service.get_movies_for_date(date, force_refresh)),
        )
        .await;
        self.combine(results)
    }

    /// Every cached movie of every source, sorted. Never fetches.
    pub fn get_all_movies(&self) -> Result<Vec<Movie>> {
        let mut movies = Vec::new();
        for service in &self.services {
            movies.extend(service.get_all_movies()?);
        }
        sort_movies(&mut movies);
        Ok(movies)
    }

    /// Force a refresh of the scope's month across all sources
    pub async fn refresh(&self, scope: RefreshScope) -> Result<AggregateResult> {
        match scope {
            RefreshScope::Date(date) => self.get_movies_for_date(date, true).await,
            RefreshScope::Month(month) => self.get_movies_for_month(month, true).await,
            RefreshScope::CurrentMonth => self.get_movies_for_month(Month::current(), true).await,
        }
    }

    /// Delete every snapshot of every source. Returns how many were removed.
    pub fn clear_cache(&self) -> Result<usize> {
        let mut removed = 0;
        for service in &self.services {
            removed += service.clear_cache()?;
        }
        Ok(removed)
    }

    pub fn stats(&self) -> Result<HubStats> {
        let sources = self
            .services
            .iter()
            .map(|service| service.stats())
            .collect::<Result<Vec<_>>>()?;

        Ok(HubStats {
            total_months: sources.iter().map(|s| s.total_months).sum(),
            total_movies: sources.iter().map(|s| s.total_movies).sum(),
            sources,
        })
    }

    fn combine(&self, results: Vec<Result<Vec<Movie>>>) -> Result<AggregateResult> {
        let mut aggregate = AggregateResult::default();

        for (service, result) in self.services.iter().zip(results) {
            match result {
                Ok(movies) => aggregate.movies.extend(movies),
                Err(e) => {
                    warn!("Source {} failed: {}", service.slug(), e);
                    aggregate.failures.push(SourceFailure {
                        source: service.slug().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !self.services.is_empty() && aggregate.failures.len() == self.services.len() {
            return Err(ServiceError::AllSourcesFailed(
                aggregate
                    .failures
                    .iter()
                    .map(|f| format!("{}: {}", f.source, f.error))
                    .collect(),
            ));
        }

        sort_movies(&mut aggregate.movies);
        Ok(aggregate)
    }
}
