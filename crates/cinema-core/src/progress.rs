use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// What enrichment achieved for one movie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// Matched in TMDB
    Enriched,
    /// No match, but a poster was scraped from the film page
    PosterOnly,
    /// Nothing changed
    Unchanged,
    /// A lookup call failed; the category names the failing step
    Failed(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub enriched: usize,
    pub poster_only: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Tallies an enrichment batch and logs periodic progress plus one summary line
pub struct EnrichmentProgress {
    summary: EnrichmentSummary,
    start_time: Instant,
    progress_interval: usize, // Log every N movies
    last_progress_log: usize,
    error_counts: HashMap<&'static str, usize>,
}

impl EnrichmentProgress {
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > progress_interval {
            info!("Enriching {} movies", total);
        }
        Self {
            summary: EnrichmentSummary {
                total,
                ..Default::default()
            },
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record(&mut self, outcome: EnrichOutcome) {
        match outcome {
            EnrichOutcome::Enriched => self.summary.enriched += 1,
            EnrichOutcome::PosterOnly => self.summary.poster_only += 1,
            EnrichOutcome::Unchanged => self.summary.unchanged += 1,
            EnrichOutcome::Failed(category) => {
                self.summary.failed += 1;
                *self.error_counts.entry(category).or_insert(0) += 1;
            }
        }
    }

    /// `current` is 1-based
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log < self.progress_interval || current == self.summary.total {
            return;
        }
        let s = &self.summary;
        info!(
            "Enrichment progress: {}/{} | Enriched: {} | Poster only: {} | Failed: {}",
            current, s.total, s.enriched, s.poster_only, s.failed
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self, operation_name: &str) {
        let s = &self.summary;
        let elapsed = self.start_time.elapsed().as_secs_f64();

        if s.failed > 0 {
            let mut entries: Vec<_> = self.error_counts.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1));
            let breakdown: Vec<String> = entries.iter().map(|(c, n)| format!("{}: {}", c, n)).collect();

            warn!(
                "{} completed: {} movies in {:.1}s | Enriched: {} | Poster only: {} | Unchanged: {} | Failed: {} ({})",
                operation_name, s.total, elapsed, s.enriched, s.poster_only, s.unchanged, s.failed,
                breakdown.join(", ")
            );
        } else if s.total > 0 {
            info!(
                "{} completed: {} movies in {:.1}s | Enriched: {} | Poster only: {} | Unchanged: {}",
                operation_name, s.total, elapsed, s.enriched, s.poster_only, s.unchanged
            );
        }
    }

    pub fn summary(&self) -> EnrichmentSummary {
        self.summary
    }
}
