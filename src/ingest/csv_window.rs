//! Recorded windows stored as CSV.
//!
//! Each row is one time-step with nine numeric columns in axis order
//! (`ax1, ay1, az1, ax2, ay2, az2, gx, gy, gz`). A tenth leading column is
//! treated as a timestamp and ignored. A non-numeric first row is a header.

use super::IngestError;
use crate::core::sample::CHANNEL_COUNT;
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

/// Load the rows of a recorded window.
pub fn load_rows(path: impl AsRef<Path>) -> Result<Vec<[f64; CHANNEL_COUNT]>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        match parse_record(&record) {
            Ok(values) => rows.push(values),
            // Header row
            Err(_) if row_idx == 0 => continue,
            Err(reason) => {
                return Err(IngestError::InvalidRow {
                    row: row_idx + 1,
                    reason,
                });
            }
        }
    }

    Ok(rows)
}

/// Load a recorded window as one flat interleaved array.
pub fn load_flat(path: impl AsRef<Path>) -> Result<Vec<f64>, IngestError> {
    Ok(load_rows(path)?.into_iter().flatten().collect())
}

fn parse_record(record: &StringRecord) -> Result<[f64; CHANNEL_COUNT], String> {
    let skip = match record.len() {
        CHANNEL_COUNT => 0,
        n if n == CHANNEL_COUNT + 1 => 1,
        n => return Err(format!("expected {CHANNEL_COUNT} columns, got {n}")),
    };

    let mut values = [0.0; CHANNEL_COUNT];
    for (slot, field) in values.iter_mut().zip(record.iter().skip(skip)) {
        *slot = field
            .parse()
            .map_err(|_| format!("invalid number {field:?}"))?;
    }
    Ok(values)
}
