pub mod clear;
pub mod config;
pub mod movies;
pub mod refresh;
pub mod stats;
mod ui;

use chrono::NaiveDate;
use cinema_config::{Config, CredentialStore, PathManager};
use cinema_core::{parse_date, parse_month, CinemaHub, ServiceError};
use cinema_models::Month;
use color_eyre::eyre::eyre;
use color_eyre::Result;

/// What a `--month` / `--date` pair asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Cached,
    Month(Month),
    Date(NaiveDate),
}

/// Validates the flags before anything touches the network
pub fn parse_query(month: Option<&str>, date: Option<&str>) -> std::result::Result<Query, ServiceError> {
    match (month, date) {
        (Some(_), Some(_)) => Err(ServiceError::InvalidQuery(
            "--month and --date cannot be combined".to_string(),
        )),
        (Some(m), None) => parse_month(m).map(Query::Month),
        (None, Some(d)) => parse_date(d).map(Query::Date),
        (None, None) => Ok(Query::Cached),
    }
}

pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

pub fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let credentials_file = paths.credentials_file();
    let mut credentials = CredentialStore::new(credentials_file.clone());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(credentials)
}

pub fn build_hub() -> Result<CinemaHub> {
    let paths = PathManager::default();
    let config = load_config(&paths)?;
    let credentials = load_credentials(&paths)?;

    tracing::debug!("Using data directory {}", paths.data_dir().display());
    CinemaHub::from_config(&config, &credentials, &paths)
        .map_err(|e| eyre!("Failed to set up sources: {}", e))
}
