use thiserror::Error;

/// Failure to produce the leaf set for a branch.
///
/// Every variant is fatal to the analysis request that triggered the lookup;
/// callers must not substitute an empty leaf list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("schedule file not found: {0}")]
    FileNotFound(std::path::PathBuf),

    #[error("invalid branch prefix: {0:?}")]
    InvalidBranch(String),

    #[error("missing column '{0}' in schedule data")]
    MissingColumn(&'static str),

    #[error("null {column} at row {row}")]
    NullValue { column: &'static str, row: usize },

    #[error("upstream lookup for branch {branch} failed: {message}")]
    Upstream { branch: String, message: String },

    #[error("upstream lookup for branch {branch} timed out after {secs}s")]
    Timeout { branch: String, secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),
}
