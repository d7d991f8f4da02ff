use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors – fatal for a render cycle, shown to the user
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("unexpected data layout: {0}")]
    InvalidShape(String),
}

// ---------------------------------------------------------------------------
// Aggregate errors – recoverable, isolated to a single chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum AggregateError {
    #[error("need at least {needed} scores, found {found}")]
    InsufficientData { needed: usize, found: usize },
    /// Every score equals `mean`; the spread is zero so no density exists.
    #[error("all scores equal {mean}, standard deviation is zero")]
    ZeroVariance { mean: f64 },
}
