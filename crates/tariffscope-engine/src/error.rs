use std::path::PathBuf;

use tariffscope_store::StoreError;

/// Errors from the engine's I/O boundary. Analysis itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("candidate lookup failed: {0}")]
    Lookup(#[from] StoreError),

    #[error("invalid engine config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}
