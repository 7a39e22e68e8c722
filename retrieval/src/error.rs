//! Error types for the retrieval agent.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] simrank_embeddings::EmbeddingError),

    /// Chat completion failed with a non-success status.
    #[error("chat request failed with status {status}: {message}")]
    ChatRequest { status: u16, message: String },

    /// Chat provider not configured.
    #[error("chat provider not configured (missing API key)")]
    ChatNotConfigured,

    /// The chat provider answered with something unusable.
    #[error("invalid chat response: {0}")]
    InvalidResponse(String),

    /// The chat request did not finish in time.
    #[error("chat request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A question was asked before any document was ingested.
    #[error("no documents have been ingested")]
    EmptyStore,

    /// Vector store rejected an insert or query.
    #[error("vector store error: {0}")]
    Store(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
