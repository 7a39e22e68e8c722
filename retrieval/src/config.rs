//! Configuration for the retrieval agent.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Configuration for the retrieval agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// How documents are split into chunks.
    pub chunker: ChunkerConfig,

    /// Number of chunks handed to the chat model per question.
    pub top_k: usize,

    /// Sampling temperature for answers.
    pub temperature: f32,

    /// Chat model to use (provider default when unset).
    pub chat_model: Option<String>,

    /// Maximum number of chunk embeddings in flight.
    pub concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            top_k: 3,
            temperature: 0.0,
            chat_model: None,
            concurrency: 4,
        }
    }
}

impl RetrievalConfig {
    /// Set the chunker configuration.
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    /// Set how many chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the chat model.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Set the embedding concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Check that the values can be used together.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RetrievalError::Config("top_k must be at least 1".to_string()));
        }
        self.chunker.validate()
    }
}

/// Configuration for splitting text into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

impl ChunkerConfig {
    /// Create a chunker configuration.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Check that the overlap leaves room for new text in every chunk.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RetrievalError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RetrievalError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.chunker, ChunkerConfig::new(500, 100));
        assert_eq!(config.top_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(ChunkerConfig::new(100, 100).validate().is_err());
        assert!(ChunkerConfig::new(0, 0).validate().is_err());
        assert!(ChunkerConfig::new(100, 99).validate().is_ok());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        assert!(RetrievalConfig::default().with_top_k(0).validate().is_err());
    }
}
