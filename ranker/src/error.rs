//! Error types for the similarity ranker.

use thiserror::Error;

use simrank_embeddings::EmbeddingError;

use crate::ranker::RankerState;

/// Result type alias for ranker operations.
pub type Result<T> = std::result::Result<T, RankerError>;

/// Errors that can occur while loading, embedding or ranking a corpus.
#[derive(Error, Debug)]
pub enum RankerError {
    /// The corpus is malformed, empty, or has duplicate keys.
    #[error("invalid corpus: {0}")]
    InvalidCorpus(String),

    /// The embedding provider failed for one item.
    #[error("embedding provider failed for '{key}': {source}")]
    Provider {
        key: String,
        #[source]
        source: EmbeddingError,
    },

    /// An operation was called in the wrong lifecycle state.
    #[error("ranker not ready: state is {state}")]
    NotReady { state: RankerState },

    /// The query key does not name a corpus item.
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    /// Two embeddings being compared have different lengths.
    #[error("dimension mismatch for '{key}': expected {expected}, got {actual}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// An embedding has zero magnitude, so cosine similarity is undefined.
    #[error("zero-magnitude embedding for '{key}'")]
    ZeroMagnitude { key: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RankerError {
    /// Whether the session can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownTarget(_))
    }
}
