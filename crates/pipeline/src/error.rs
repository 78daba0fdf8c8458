use blusanta_cloud::CloudError;
use blusanta_stitcher::StitcherApiError;

/// Errors raised by the pipeline stages.
///
/// Per-record failures are stored on the record instead; these are the
/// failures that end a stage run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Stitcher(#[from] StitcherApiError),

    #[error("No stitching capacity: {0}")]
    Capacity(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
