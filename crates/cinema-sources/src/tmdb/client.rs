use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use crate::error::TmdbError;
use super::models::{Credits, MovieDetails, SearchResponse, SearchResult};
use super::MetadataProvider;

const BASE_URL: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: Option<String>,
}

impl TmdbClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            language: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", BASE_URL, path)
    }

    fn base_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("api_key", self.api_key.clone())];
        if let Some(language) = &self.language {
            query.push(("language", language.clone()));
        }
        query
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, extra: &[(&'static str, String)]) -> Result<T, TmdbError> {
        let mut query = self.base_query();
        query.extend(extra.iter().cloned());

        debug!("TMDB GET {}", path);
        let response = self.client.get(self.url(path)).query(&query).send().await?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TmdbError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(TmdbError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search_movie(&self, title: &str, year: Option<i32>) -> Result<Option<SearchResult>, TmdbError> {
        let mut extra = vec![("query", title.to_string())];
        if let Some(year) = year {
            extra.push(("year", year.to_string()));
        }
        let response: SearchResponse = self.get("/search/movie", &extra).await?;
        Ok(response.results.into_iter().next())
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, TmdbError> {
        self.get(&format!("/movie/{}", id), &[]).await
    }

    async fn movie_credits(&self, id: u64) -> Result<Credits, TmdbError> {
        self.get(&format!("/movie/{}/credits", id), &[]).await
    }
}

/// Sized image URL for a TMDB `poster_path`
pub fn poster_url(size: &str, poster_path: &str) -> String {
    format!("{}/{}{}", IMAGE_BASE_URL, size, poster_path)
}
