use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use cinema_models::{Month, Movie, MonthSnapshot};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Snapshot files of one source, one JSON file per month.
///
/// The store never expires anything; staleness is decided by the caller.
#[derive(Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    source: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
    pub month: Month,
    pub movie_count: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub source: String,
    pub total_months: usize,
    pub total_movies: usize,
    pub months: Vec<MonthStats>,
}

impl SnapshotStore {
    pub fn new(dir: &Path, source: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn snapshot_path(&self, month: Month) -> PathBuf {
        self.dir.join(format!("{}-{}.json", self.source, month))
    }

    /// Month encoded in a snapshot file name of this source, if it is one
    fn month_of_file(&self, file_name: &str) -> Option<Month> {
        file_name
            .strip_prefix(self.source.as_str())?
            .strip_prefix('-')?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }

    pub fn get(&self, month: Month) -> Result<Option<MonthSnapshot>> {
        let path = self.snapshot_path(month);

        if !path.exists() {
            debug!("Cache miss: {} {} (file does not exist)", self.source, month);
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read snapshot for {} {}: {}", self.source, month, e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<MonthSnapshot>(&content) {
            Ok(snapshot) => {
                debug!("Cache hit: {} {} ({} movies)", self.source, month, snapshot.movies.len());
                Ok(Some(snapshot))
            }
            Err(e) => {
                warn!(
                    "Snapshot corruption detected for {} {}: {}. Deleting corrupted file.",
                    self.source, month, e
                );
                if let Err(rm_err) = std::fs::remove_file(&path) {
                    warn!("Failed to delete corrupted snapshot: {}", rm_err);
                }
                Ok(None)
            }
        }
    }

    /// Replace the snapshot for `month` with a freshly stamped one
    pub fn save(&self, month: Month, movies: Vec<Movie>, theater: &str) -> Result<MonthSnapshot> {
        let snapshot = MonthSnapshot::new(month, theater, movies);
        let path = self.snapshot_path(month);

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| anyhow!("Failed to serialize snapshot {} {}: {}", self.source, month, e))?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &path)?;

        debug!("Snapshot saved: {} {} ({} movies)", self.source, month, snapshot.total_movies);
        Ok(snapshot)
    }

    /// Every persisted month, ascending
    pub fn all_months(&self) -> Result<Vec<Month>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut months = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(month) = entry.file_name().to_str().and_then(|name| self.month_of_file(name)) {
                months.push(month);
            }
        }
        months.sort();
        Ok(months)
    }

    /// Movies of every persisted month, month by month
    pub fn all_movies(&self) -> Result<Vec<Movie>> {
        let mut movies = Vec::new();
        for month in self.all_months()? {
            if let Some(snapshot) = self.get(month)? {
                movies.extend(snapshot.movies);
            }
        }
        Ok(movies)
    }

    /// Delete every snapshot of this source. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let months = self.all_months()?;
        for month in &months {
            std::fs::remove_file(self.snapshot_path(*month))?;
        }
        info!("Cleared {} snapshot(s) for {}", months.len(), self.source);
        Ok(months.len())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let mut months = Vec::new();
        for month in self.all_months()? {
            if let Some(snapshot) = self.get(month)? {
                months.push(MonthStats {
                    month,
                    movie_count: snapshot.movies.len(),
                    last_updated: snapshot.last_updated,
                });
            }
        }

        Ok(StoreStats {
            source: self.source.clone(),
            total_months: months.len(),
            total_movies: months.iter().map(|m| m.movie_count).sum(),
            months,
        })
    }
}
