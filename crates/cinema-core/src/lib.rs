pub mod cache;
pub mod enrichment;
pub mod error;
pub mod grouping;
pub mod hub;
pub mod progress;
pub mod query;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{MonthStats, SnapshotStore, StoreStats};
pub use enrichment::{clean_title, scrape_poster, EnrichmentConfig, Enricher};
pub use error::ServiceError;
pub use grouping::{group_screenings, movie_id};
pub use hub::{sort_movies, AggregateResult, CinemaHub, HubStats, RefreshScope, SourceFailure};
pub use query::{parse_date, parse_month};
pub use progress::{EnrichOutcome, EnrichmentProgress, EnrichmentSummary};
pub use service::SourceService;
