//! TMDB metadata lookups.

mod client;
mod models;

use async_trait::async_trait;
use crate::error::TmdbError;

pub use client::{poster_url, TmdbClient, IMAGE_BASE_URL};
pub use models::{Credits, CrewMember, Genre, MovieDetails, SearchResult};

/// Search-by-title plus details and credits by id.
///
/// `TmdbClient` is the live implementation; the enricher only sees this trait.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// First match for `title`, `None` when the search is empty
    async fn search_movie(&self, title: &str, year: Option<i32>) -> Result<Option<SearchResult>, TmdbError>;

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, TmdbError>;

    async fn movie_credits(&self, id: u64) -> Result<Credits, TmdbError>;
}
