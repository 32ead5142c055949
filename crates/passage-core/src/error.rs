use thiserror::Error;

/// Failure kinds surfaced by the retrieval pipeline.
///
/// Every variant is terminal for the operation that produced it; nothing is
/// retried internally and no partial success is reported.
#[derive(Debug, Error)]
pub enum Error {
    #[error("embedding model is not loaded; call load() first")]
    ModelNotLoaded,

    #[error("embedding dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("document produced no indexable text")]
    EmptyDocument,

    #[error("no documents have been ingested yet")]
    EmptyIndex,

    #[error("invalid chunk parameters: {0}")]
    InvalidChunkParameters(String),

    #[error("answer synthesis failed ({status}): {message}")]
    Synthesis { status: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
