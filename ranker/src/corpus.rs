//! Corpus items and loading.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RankerError, Result};

/// One described item in a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier from the source data.
    pub id: String,

    /// Display name; its normalized form is the lookup key.
    pub name: String,

    /// Text the embedding is derived from.
    pub description: String,
}

impl Item {
    /// Create a new item.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// The normalized lookup key for this item.
    pub fn key(&self) -> String {
        normalize_key(&self.name)
    }
}

/// Normalize a name or query into a cache key.
///
/// Keys are compared case-insensitively and ignore surrounding whitespace.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A validated, ordered set of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    items: Vec<Item>,
}

impl Corpus {
    /// Validate items and build a corpus.
    ///
    /// Rejects an empty list, blank names, and names that collide after
    /// normalization.
    pub fn new(items: Vec<Item>) -> Result<Self> {
        if items.is_empty() {
            return Err(RankerError::InvalidCorpus("corpus is empty".to_string()));
        }

        let mut seen = HashSet::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let key = item.key();
            if key.is_empty() {
                return Err(RankerError::InvalidCorpus(format!(
                    "item {position} (id '{}') has an empty name",
                    item.id
                )));
            }
            if !seen.insert(key) {
                return Err(RankerError::InvalidCorpus(format!(
                    "duplicate item name '{}' (id '{}')",
                    item.name, item.id
                )));
            }
        }

        Ok(Self { items })
    }

    /// Parse a corpus from a JSON array of `{id, name, description}` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<Item> = serde_json::from_str(json)
            .map_err(|e| RankerError::InvalidCorpus(format!("malformed corpus JSON: {e}")))?;
        Self::new(items)
    }

    /// Read and parse a corpus file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let corpus = Self::from_json(&content)?;
        info!("Loaded {} items from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// The items in load order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Consume the corpus, returning its items.
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the corpus has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
