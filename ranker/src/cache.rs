//! Per-session embedding cache keyed by normalized item name.

use std::collections::HashMap;

use tracing::debug;

use simrank_embeddings::Embedding;

/// Embeddings for one corpus load.
///
/// Each key is written at most once; the ranker is the only writer.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: HashMap<String, Embedding>,
}

impl EmbeddingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an embedding under a normalized key.
    ///
    /// Returns `false` and leaves the existing vector untouched when the key
    /// is already present.
    pub fn insert(&mut self, key: String, embedding: Embedding) -> bool {
        if self.entries.contains_key(&key) {
            debug!("Ignoring second embedding for '{key}'");
            return false;
        }
        self.entries.insert(key, embedding);
        true
    }

    /// Look up the embedding for a normalized key.
    pub fn get(&self, key: &str) -> Option<&Embedding> {
        self.entries.get(key)
    }

    /// Check if a key has an embedding.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached embeddings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
