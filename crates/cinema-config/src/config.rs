use serde::{Deserialize, Serialize};
use std::path::Path;

/// Slugs of every theater the aggregator knows how to read
pub const KNOWN_SOURCES: &[&str] = &[
    "filmoteca",
    "zumzeig",
    "renoir",
    "verdi",
    "mooby-aribau",
    "mooby-balmes",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub enrichment: EnrichmentSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between detail-page fetches of multi-page sources
    #[serde(default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    /// Still off at runtime when no TMDB key is available
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Pause between enrichment calls (TMDB allows ~40 requests / 10s)
    #[serde(default = "default_enrichment_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_poster_size")]
    pub poster_size: String,
    #[serde(default)]
    pub language: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_enabled_sources() -> Vec<String> {
    KNOWN_SOURCES.iter().map(|s| s.to_string()).collect()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_detail_delay_ms() -> u64 {
    200
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; cinehub/0.1; +https://github.com/cinehub)".to_string()
}

fn default_enrichment_delay_ms() -> u64 {
    250
}

fn default_poster_size() -> String {
    "w500".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            detail_delay_ms: default_detail_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            delay_ms: default_enrichment_delay_ms(),
            poster_size: default_poster_size(),
            language: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sources.enabled.is_empty() {
            return Err(anyhow::anyhow!("sources.enabled cannot be empty"));
        }

        for source in &self.sources.enabled {
            if !KNOWN_SOURCES.contains(&source.as_str()) {
                return Err(anyhow::anyhow!(
                    "Unknown source '{}' in sources.enabled (known: {})",
                    source,
                    KNOWN_SOURCES.join(", ")
                ));
            }
        }

        if self.fetch.timeout_secs == 0 {
            return Err(anyhow::anyhow!("fetch.timeout_secs must be greater than zero"));
        }

        if self.enrichment.poster_size.trim().is_empty() {
            return Err(anyhow::anyhow!("enrichment.poster_size cannot be empty"));
        }

        Ok(())
    }

    pub fn is_source_enabled(&self, slug: &str) -> bool {
        self.sources.enabled.iter().any(|s| s == slug)
    }
}
