use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Variable '{variable}' does not exist in catalog '{catalog}'")]
    UnknownVariable { variable: String, catalog: String },

    #[error("Variable list is empty")]
    EmptyVariables,

    #[error("Scale must be a positive finite number of meters, got {0}")]
    InvalidScale(f64),

    #[error("Cannot extract a series over an empty {0} geometry")]
    EmptyGeometry(&'static str),

    #[error("Reduction covers {pixels} pixels, more than the budget of {max_pixels}")]
    PixelBudgetExceeded { pixels: u64, max_pixels: u64 },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Catalog '{catalog}' is missing required column '{column}'")]
    MissingColumn { catalog: String, column: String },

    #[error("Catalog '{catalog}' column '{column}' has unsupported type {dtype}")]
    UnsupportedColumnType {
        catalog: String,
        column: String,
        dtype: String,
    },

    #[error("Failed to resolve cache directory")]
    CacheDirResolution,

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Catalog download or decompression failed")]
    DownloadIo(#[source] std::io::Error),

    #[error("Failed to parse CSV catalog data for '{catalog}'")]
    CsvRead {
        catalog: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to scan CSV catalog file '{0}'")]
    CsvScan(PathBuf, #[source] PolarsError),

    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet catalog file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed building the reduction plan: {0}")]
    Polars(#[from] PolarsError),
}
