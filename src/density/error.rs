use chrono::{DateTime, Utc};
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DensityError {
    #[error("'{0}' not found in coordinates or data variables")]
    NotFound(String),

    #[error("No valid data for '{variable}'")]
    EmptyData { variable: String },

    #[error("All values of '{variable}' are identical ({value})")]
    DegenerateRange { variable: String, value: f64 },

    #[error("Frame {index} is out of range for a time axis of length {len}")]
    FrameOutOfRange { index: usize, len: usize },

    // Time-of-day buckets assume every time step sits on a whole hour
    #[error("Timestamp {timestamp} is not on a whole hour")]
    IrregularTimeAxis { timestamp: DateTime<Utc> },

    #[error("'{variable}' has {found} values for the selection, the grid has {expected} cells")]
    NotGridded {
        variable: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid bin specification: {0}")]
    InvalidBinCount(String),

    #[error("Failed building DataFrame from estimate")]
    DataFrame(#[from] PolarsError),

    #[error("Failed to create CSV file '{0}'")]
    CsvCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed to write CSV file '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),
}
