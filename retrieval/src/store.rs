//! Vector store for document chunks.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use simrank_embeddings::{Embedding, cosine_from_parts, dot_product, magnitude};

use crate::error::{Result, RetrievalError};

/// A chunk of text with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The chunk text.
    pub content: String,

    /// Source the chunk was cut from (file name, URL...).
    pub source: Option<String>,

    /// Position of the chunk within its source.
    pub chunk_index: usize,
}

impl Document {
    /// Create a new document.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
            chunk_index: 0,
        }
    }

    /// Set the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the chunk index.
    pub fn with_chunk_index(mut self, index: usize) -> Self {
        self.chunk_index = index;
        self
    }
}

/// A document returned from a search, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// The matched document.
    pub document: Document,

    /// Cosine similarity to the query.
    pub score: f32,
}

/// Storage and similarity search over embedded documents.
pub trait VectorStore: Send + Sync {
    /// Add a document with its embedding.
    fn add(&mut self, document: Document, embedding: Embedding) -> Result<()>;

    /// Add several documents at once. Either all of them are stored or,
    /// on error, none are.
    fn add_all(&mut self, entries: Vec<(Document, Embedding)>) -> Result<()>;

    /// Return the `k` documents most similar to `query`, best first.
    fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>>;

    /// Number of stored documents.
    fn len(&self) -> usize;

    /// Whether the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    document: Document,
    embedding: Embedding,
    magnitude: f32,
}

/// Brute-force vector store kept in memory.
///
/// The first insert fixes the dimension; later inserts and queries must
/// match it.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: Vec<StoredEntry>,
    dimension: Option<usize>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension of the stored embeddings, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Remove every document.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dimension = None;
    }

    /// Check an embedding against the store's dimension and return its magnitude.
    fn validate(
        expected: Option<usize>,
        document: &Document,
        embedding: &[f32],
    ) -> Result<f32> {
        match expected {
            Some(expected) if embedding.len() != expected => {
                return Err(RetrievalError::Store(format!(
                    "dimension mismatch: expected {expected}, got {}",
                    embedding.len()
                )));
            }
            _ => {}
        }

        let magnitude = magnitude(embedding);
        if magnitude == 0.0 {
            return Err(RetrievalError::Store(format!(
                "zero-magnitude embedding for chunk {}",
                document.chunk_index
            )));
        }
        Ok(magnitude)
    }
}

impl VectorStore for InMemoryVectorStore {
    fn add(&mut self, document: Document, embedding: Embedding) -> Result<()> {
        self.add_all(vec![(document, embedding)])
    }

    fn add_all(&mut self, entries: Vec<(Document, Embedding)>) -> Result<()> {
        let mut dimension = self.dimension;
        let mut validated = Vec::with_capacity(entries.len());
        for (document, embedding) in entries {
            let magnitude = Self::validate(dimension, &document, &embedding)?;
            dimension = Some(embedding.len());
            validated.push(StoredEntry {
                document,
                embedding,
                magnitude,
            });
        }

        self.dimension = dimension;
        self.entries.extend(validated);
        Ok(())
    }

    fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        let query_magnitude = magnitude(query);

        let mut scored = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let dot = dot_product(query, &entry.embedding)?;
            let score = cosine_from_parts(dot, query_magnitude, entry.magnitude)?;
            scored.push((score, entry));
        }

        // Stable: equal scores keep insertion order.
        scored.sort_by_key(|(score, _)| Reverse(OrderedFloat(*score)));

        let results: Vec<ScoredDocument> = scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| ScoredDocument {
                document: entry.document.clone(),
                score,
            })
            .collect();

        debug!(
            "Similarity search returned {} of {} documents",
            results.len(),
            self.entries.len()
        );
        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
