//! Persistent memoization of provider responses.
//!
//! [`EmbeddingStore`] maps (model, text) to a vector so repeated runs over the
//! same corpus do not pay for the same API call twice. [`CachedProvider`]
//! puts the store in front of any [`EmbeddingProvider`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// Cache entry for an embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of the model, requested dimensions and text that were embedded.
    pub text_hash: String,

    /// The embedding vector.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// When the entry was created (unix seconds).
    pub created_at: i64,
}

/// Store of embeddings keyed by model, requested dimensions and input text.
pub struct EmbeddingStore {
    /// In-memory entries.
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Path for persistent storage.
    cache_path: Option<PathBuf>,

    /// Maximum number of entries.
    max_entries: usize,

    /// Serializes writes to the cache file.
    save_lock: Mutex<()>,
}

impl EmbeddingStore {
    /// Create a new in-memory store.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            cache_path: None,
            max_entries: max_entries.max(1),
            save_lock: Mutex::new(()),
        }
    }

    /// Create a store backed by a JSON file, loading it if it exists.
    pub async fn with_persistence(path: impl AsRef<Path>, max_entries: usize) -> Result<Self> {
        let store = Self {
            cache_path: Some(path.as_ref().to_path_buf()),
            ..Self::new(max_entries)
        };
        store.load().await?;
        Ok(store)
    }

    /// Compute a stable key for cache lookup.
    ///
    /// `dimensions` is part of the key: the same text shortened to a different
    /// length is a different vector.
    fn hash_key(text: &str, model: &str, dimensions: Option<usize>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        if let Some(dimensions) = dimensions {
            hasher.update(dimensions.to_string().as_bytes());
        }
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Get an embedding from the store.
    pub async fn get(
        &self,
        text: &str,
        model: &str,
        dimensions: Option<usize>,
    ) -> Option<Embedding> {
        let key = Self::hash_key(text, model, dimensions);
        let entries = self.entries.read().await;
        entries.get(&key).map(|e| e.embedding.clone())
    }

    /// Put an embedding in the store.
    pub async fn put(
        &self,
        text: &str,
        model: &str,
        dimensions: Option<usize>,
        embedding: Embedding,
    ) -> Result<()> {
        let key = Self::hash_key(text, model, dimensions);
        let entry = CacheEntry {
            text_hash: key.clone(),
            embedding,
            model: model.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };

        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, v)| v.created_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
                debug!("Evicted oldest cached embedding");
            }
        }

        entries.insert(key, entry);
        debug!("Cached embedding for text (model: {model})");

        if self.cache_path.is_some() {
            drop(entries); // Release lock before I/O
            self.save().await?;
        }

        Ok(())
    }

    /// Check if an embedding is cached.
    pub async fn contains(&self, text: &str, model: &str, dimensions: Option<usize>) -> bool {
        let key = Self::hash_key(text, model, dimensions);
        self.entries.read().await.contains_key(&key)
    }

    /// Clear the entire store.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared embedding store");
    }

    /// Get store statistics.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let mut models: Vec<String> = entries
            .values()
            .map(|e| e.model.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        models.sort();
        CacheStats {
            entries: entries.len(),
            max_entries: self.max_entries,
            models,
        }
    }

    async fn save(&self) -> Result<()> {
        if let Some(ref path) = self.cache_path {
            let _guard = self.save_lock.lock().await;
            let (content, count) = {
                let entries = self.entries.read().await;
                let snapshot: Vec<&CacheEntry> = entries.values().collect();
                (serde_json::to_string(&snapshot)?, snapshot.len())
            };

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }

            fs::write(path, content).await?;
            debug!("Saved {count} cache entries to {}", path.display());
        }
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        let Some(ref path) = self.cache_path else {
            return Ok(());
        };
        if !fs::try_exists(path).await? {
            return Ok(());
        }

        let content = fs::read_to_string(path).await?;
        let loaded: Vec<CacheEntry> = serde_json::from_str(&content)?;

        let mut entries = self.entries.write().await;
        for entry in loaded {
            entries.insert(entry.text_hash.clone(), entry);
        }

        info!("Loaded {} cache entries from {}", entries.len(), path.display());
        Ok(())
    }
}

/// Statistics about the embedding store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries in the store.
    pub entries: usize,

    /// Maximum store size.
    pub max_entries: usize,

    /// Models with cached embeddings.
    pub models: Vec<String>,
}

/// A provider that answers from an [`EmbeddingStore`] before calling the
/// wrapped provider.
pub struct CachedProvider<P> {
    provider: P,
    store: EmbeddingStore,
}

impl<P> CachedProvider<P>
where
    P: EmbeddingProvider,
{
    /// Create a new cached provider.
    pub fn new(provider: P, store: EmbeddingStore) -> Self {
        Self { provider, store }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }
}

#[async_trait]
impl<P> EmbeddingProvider for CachedProvider<P>
where
    P: EmbeddingProvider,
{
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn default_model(&self) -> &str {
        self.provider.default_model()
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string());

        let dimensions = request.dimensions;
        if let Some(embedding) = self.store.get(&request.text, &model, dimensions).await {
            debug!("Cache hit for embedding");
            return Ok(EmbeddingResponse::new(embedding, model));
        }

        let text = request.text.clone();
        let response = self.provider.embed(request).await?;
        self.store
            .put(&text, &model, dimensions, response.embedding.clone())
            .await?;

        Ok(response)
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}
