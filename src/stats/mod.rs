//! Pipeline activity statistics.
//!
//! Counts what the agent ingested, dropped, classified and published so the
//! `status` command can report on previous sessions.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_stats, create_shared_stats_with_persistence, PersistedStats, PipelineStats,
    PipelineStatsSnapshot, SharedPipelineStats, STATS_FILE,
};
