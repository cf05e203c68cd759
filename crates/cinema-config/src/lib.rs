pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, EnrichmentSettings, FetchSettings, SourcesConfig, KNOWN_SOURCES};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
