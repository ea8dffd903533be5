//! Atomic pipeline counters with JSON persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// File name of persisted stats inside the data directory.
pub const STATS_FILE: &str = "stats.json";

/// Counters for the current session.
#[derive(Debug)]
pub struct PipelineStats {
    /// Samples handed to the controller
    samples_ingested: AtomicU64,
    /// Input messages or lines that produced no sample
    messages_dropped: AtomicU64,
    /// Windows classified successfully
    windows_classified: AtomicU64,
    /// Classification cycles that failed or timed out
    classification_failures: AtomicU64,
    /// Results written to the sink
    results_published: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self {
            samples_ingested: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
            windows_classified: AtomicU64::new(0),
            classification_failures: AtomicU64::new(0),
            results_published: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create stats that continue from the totals saved at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            tracing::warn!(error = %e, "Could not load previous pipeline stats");
        }

        stats
    }

    pub fn record_sample_ingested(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_messages_dropped(&self, count: u64) {
        self.messages_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_window_classified(&self) {
        self.windows_classified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classification_failure(&self) {
        self.classification_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result_published(&self) {
        self.results_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            windows_classified: self.windows_classified.load(Ordering::Relaxed),
            classification_failures: self.classification_failures.load(Ordering::Relaxed),
            results_published: self.results_published.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        self.stats().summary()
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_ingested: stats.samples_ingested,
                messages_dropped: stats.messages_dropped,
                windows_classified: stats.windows_classified,
                classification_failures: stats.classification_failures,
                results_published: stats.results_published,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(persisted) = PersistedStats::read(path)? {
                self.samples_ingested
                    .store(persisted.samples_ingested, Ordering::Relaxed);
                self.messages_dropped
                    .store(persisted.messages_dropped, Ordering::Relaxed);
                self.windows_classified
                    .store(persisted.windows_classified, Ordering::Relaxed);
                self.classification_failures
                    .store(persisted.classification_failures, Ordering::Relaxed);
                self.results_published
                    .store(persisted.results_published, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.samples_ingested.store(0, Ordering::Relaxed);
        self.messages_dropped.store(0, Ordering::Relaxed);
        self.windows_classified.store(0, Ordering::Relaxed);
        self.classification_failures.store(0, Ordering::Relaxed);
        self.results_published.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatsSnapshot {
    pub samples_ingested: u64,
    pub messages_dropped: u64,
    pub windows_classified: u64,
    pub classification_failures: u64,
    pub results_published: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl PipelineStatsSnapshot {
    pub fn summary(&self) -> String {
        format!(
            "Pipeline Statistics:\n\
             - Samples ingested: {}\n\
             - Messages dropped: {}\n\
             - Windows classified: {}\n\
             - Classification failures: {}\n\
             - Results published: {}\n\
             - Session duration: {} seconds",
            self.samples_ingested,
            self.messages_dropped,
            self.windows_classified,
            self.classification_failures,
            self.results_published,
            self.session_duration_secs
        )
    }
}

/// Stats format for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStats {
    pub samples_ingested: u64,
    pub messages_dropped: u64,
    pub windows_classified: u64,
    pub classification_failures: u64,
    pub results_published: u64,
    pub last_updated: DateTime<Utc>,
}

impl PersistedStats {
    /// Read saved stats, or `None` if nothing has been saved yet.
    pub fn read(path: &Path) -> Result<Option<Self>, std::io::Error> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let persisted = serde_json::from_str(&content).map_err(std::io::Error::other)?;
        Ok(Some(persisted))
    }
}

/// Thread-safe shared pipeline stats.
pub type SharedPipelineStats = Arc<PipelineStats>;

pub fn create_shared_stats() -> SharedPipelineStats {
    Arc::new(PipelineStats::new())
}

pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedPipelineStats {
    Arc::new(PipelineStats::with_persistence(path))
}
