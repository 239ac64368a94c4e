use crate::types::field::FieldError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("No .zip archive found in '{0}'")]
    NoArchive(PathBuf),

    #[error("Failed to list directory '{0}'")]
    ReadDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to open archive '{0}'")]
    ArchiveOpen(PathBuf, #[source] std::io::Error),

    #[error("Failed to read archive '{0}'")]
    Zip(PathBuf, #[source] zip::result::ZipError),

    #[error("Archive member '{0}' would extract outside the target directory")]
    UnsafeArchivePath(String),

    #[error("Failed to extract '{0}'")]
    ExtractIo(PathBuf, #[source] std::io::Error),

    #[error("No NetCDF files found in '{0}'")]
    NoDatasets(PathBuf),

    #[error("Failed to read NetCDF file '{path}': {message}")]
    Netcdf { path: PathBuf, message: String },

    #[error("NetCDF support is not compiled in; rebuild with the `netcdf` feature to read '{0}'")]
    NetcdfUnsupported(PathBuf),

    #[error("Unsupported time units '{0}'")]
    TimeUnits(String),

    #[error("Datasets have different sizes: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize, usize),
        right: (usize, usize, usize),
    },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet cache file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Cached data is malformed: {0}")]
    MalformedCache(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
