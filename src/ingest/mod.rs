//! Sensor message ingestion.
//!
//! Turns transport messages from the two vibration sensors into
//! [`Sample`](crate::core::Sample)s, and loads recorded windows from CSV.

pub mod csv_window;
pub mod fusion;
pub mod source;
pub mod types;

pub use fusion::SensorFusion;
pub use source::{forward_samples, open_source, parse_line, DynLineSource, LineSource};
pub use types::{AccelReading, CombinedReading, SensorMessage, Vector3};

use thiserror::Error;

/// Errors raised while turning input into samples.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Invalid JSON payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed line: {0:?}")]
    MalformedLine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid CSV row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}
