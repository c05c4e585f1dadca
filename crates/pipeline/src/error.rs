use normativa_core::error::CoreError;
use normativa_db::StoreError;

/// Errors that halt a pipeline run. Per-record problems never end up here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Staging file error: {0}")]
    Staging(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Summary serialization failed: {0}")]
    Summary(#[from] serde_json::Error),
}
