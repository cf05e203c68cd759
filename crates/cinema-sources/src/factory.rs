/// Source factory pattern for creating theater sources from configuration
///
/// Every theater the aggregator supports registers a factory here; the
/// enabled list in `Config` decides which ones are built.

use anyhow::Result;
use cinema_config::Config;
use std::sync::Arc;
use crate::filmoteca::FilmotecaSource;
use crate::mooby::MoobySource;
use crate::renoir::RenoirSource;
use crate::traits::CinemaSource;
use crate::verdi::VerdiSource;
use crate::zumzeig::ZumzeigSource;

/// Factory trait for creating one theater source
pub trait SourceFactory: Send + Sync {
    /// Slug of the source this factory creates
    fn source_slug(&self) -> &str;

    fn create_source(&self) -> Arc<dyn CinemaSource>;
}

/// Registry of source factories, in registration order
pub struct SourceCatalog {
    factories: Vec<Box<dyn SourceFactory>>,
}

impl SourceCatalog {
    /// Create a new catalog with all built-in theaters registered
    pub fn new() -> Self {
        let mut catalog = Self { factories: Vec::new() };

        catalog.register(Box::new(BuiltinFactory::new("filmoteca", || Arc::new(FilmotecaSource))));
        catalog.register(Box::new(BuiltinFactory::new("zumzeig", || Arc::new(ZumzeigSource))));
        catalog.register(Box::new(BuiltinFactory::new("renoir", || Arc::new(RenoirSource))));
        catalog.register(Box::new(BuiltinFactory::new("verdi", || Arc::new(VerdiSource))));
        catalog.register(Box::new(BuiltinFactory::new("mooby-aribau", || Arc::new(MoobySource::aribau()))));
        catalog.register(Box::new(BuiltinFactory::new("mooby-balmes", || Arc::new(MoobySource::balmes()))));

        catalog
    }

    /// Register a factory, replacing any previous one with the same slug
    pub fn register(&mut self, factory: Box<dyn SourceFactory>) {
        self.factories.retain(|f| f.source_slug() != factory.source_slug());
        self.factories.push(factory);
    }

    /// Create every source listed in `sources.enabled`, in that order
    pub fn create_enabled(&self, config: &Config) -> Result<Vec<Arc<dyn CinemaSource>>> {
        let mut sources = Vec::new();

        for slug in &config.sources.enabled {
            let source = self.create_by_slug(slug).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown source '{}' (registered: {})",
                    slug,
                    self.registered_sources().join(", ")
                )
            })?;
            if sources.iter().any(|s: &Arc<dyn CinemaSource>| s.slug() == source.slug()) {
                continue;
            }
            sources.push(source);
        }

        Ok(sources)
    }

    pub fn create_by_slug(&self, slug: &str) -> Option<Arc<dyn CinemaSource>> {
        self.factories
            .iter()
            .find(|f| f.source_slug() == slug)
            .map(|f| f.create_source())
    }

    pub fn registered_sources(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.source_slug()).collect()
    }

    pub fn is_registered(&self, slug: &str) -> bool {
        self.factories.iter().any(|f| f.source_slug() == slug)
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

struct BuiltinFactory {
    slug: &'static str,
    build: fn() -> Arc<dyn CinemaSource>,
}

impl BuiltinFactory {
    fn new(slug: &'static str, build: fn() -> Arc<dyn CinemaSource>) -> Self {
        Self { slug, build }
    }
}

impl SourceFactory for BuiltinFactory {
    fn source_slug(&self) -> &str {
        self.slug
    }

    fn create_source(&self) -> Arc<dyn CinemaSource> {
        (self.build)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinema_config::KNOWN_SOURCES;

    #[test]
    fn test_every_known_source_is_registered() {
        let catalog = SourceCatalog::new();
        assert_eq!(catalog.registered_sources(), KNOWN_SOURCES.to_vec());
        for slug in KNOWN_SOURCES {
            let source = catalog.create_by_slug(slug).unwrap();
            assert_eq!(source.slug(), *slug);
        }
    }

    #[test]
    fn test_create_enabled_follows_config_order() {
        let mut config = Config::default();
        config.sources.enabled = vec!["verdi".to_string(), "filmoteca".to_string(), "verdi".to_string()];

        let sources = SourceCatalog::new().create_enabled(&config).unwrap();
        let slugs: Vec<&str> = sources.iter().map(|s| s.slug()).collect();
        assert_eq!(slugs, vec!["verdi", "filmoteca"]);
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let mut config = Config::default();
        config.sources.enabled = vec!["cinesa".to_string()];
        assert!(SourceCatalog::new().create_enabled(&config).is_err());
        assert!(!SourceCatalog::new().is_registered("cinesa"));
    }
}
