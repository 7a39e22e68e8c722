//! The embed, compare and rank engine.

use std::cmp::Reverse;
use std::fmt;

use futures::stream::{self, StreamExt, TryStreamExt};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use simrank_embeddings::{
    Embedding, EmbeddingError, EmbeddingProvider, EmbeddingRequest, cosine_from_parts, dot_product,
    magnitude,
};

use crate::cache::EmbeddingCache;
use crate::corpus::{Corpus, Item, normalize_key};
use crate::error::{RankerError, Result};

/// Key reported in errors about an ad-hoc query vector.
const QUERY_KEY: &str = "<query>";

/// Configuration for a [`SimilarityRanker`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Maximum number of embedding requests in flight.
    pub concurrency: usize,

    /// Model to request (provider default when unset).
    pub model: Option<String>,

    /// Output dimensions to request, if the provider supports it.
    pub dimensions: Option<usize>,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            model: None,
            dimensions: None,
        }
    }
}

impl RankerConfig {
    /// Set the request concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the embedding model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the requested output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Lifecycle of a ranking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankerState {
    /// No corpus yet.
    Unloaded,
    /// Corpus stored, embeddings not fetched.
    Loaded,
    /// Every item has an embedding; ranking is allowed.
    Embedded,
}

impl fmt::Display for RankerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loaded => "loaded",
            Self::Embedded => "embedded",
        };
        f.write_str(name)
    }
}

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Display name of the compared item.
    pub name: String,

    /// Raw dot product with the query.
    pub dot: f32,

    /// Cosine similarity with the query.
    pub cosine: f32,
}

/// Ranks corpus items by embedding similarity.
///
/// A session moves through [`RankerState`]: `load_corpus` stores the items,
/// `embed_all` fetches one embedding per item, and only then can `rank` and
/// `rank_text` run.
pub struct SimilarityRanker<P> {
    provider: P,
    config: RankerConfig,
    corpus: Corpus,
    cache: EmbeddingCache,
    state: RankerState,
}

impl<P> SimilarityRanker<P>
where
    P: EmbeddingProvider,
{
    /// Create a ranker with the default configuration.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, RankerConfig::default())
    }

    /// Create a ranker with the given configuration.
    pub fn with_config(provider: P, config: RankerConfig) -> Self {
        Self {
            provider,
            config,
            corpus: Corpus::default(),
            cache: EmbeddingCache::new(),
            state: RankerState::Unloaded,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RankerState {
        self.state
    }

    /// Items of the loaded corpus, in load order.
    pub fn items(&self) -> &[Item] {
        self.corpus.items()
    }

    /// The session's embedding cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// The embedding provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Validate and store a corpus.
    ///
    /// Replaces any previous corpus and discards its embeddings. On failure
    /// the ranker is left as it was.
    pub fn load_corpus(&mut self, items: Vec<Item>) -> Result<()> {
        let corpus = Corpus::new(items)?;
        self.load(corpus);
        Ok(())
    }

    /// Store an already validated corpus.
    pub fn load(&mut self, corpus: Corpus) {
        info!("Loaded corpus with {} items", corpus.len());
        self.corpus = corpus;
        self.cache.clear();
        self.state = RankerState::Loaded;
    }

    /// Fetch an embedding for every item's description.
    ///
    /// Requests run with at most `concurrency` in flight. The first failure
    /// aborts the whole call: the cache is left empty and the state stays
    /// `Loaded`, so the caller can retry.
    pub async fn embed_all(&mut self) -> Result<()> {
        if self.state == RankerState::Unloaded {
            return Err(RankerError::NotReady { state: self.state });
        }

        self.cache.clear();
        self.state = RankerState::Loaded;

        let fetched = self.fetch_embeddings().await?;
        for (key, embedding) in fetched {
            self.cache.insert(key, embedding);
        }

        self.state = RankerState::Embedded;
        info!("Embedded {} corpus items", self.cache.len());
        Ok(())
    }

    async fn fetch_embeddings(&self) -> Result<Vec<(String, Embedding)>> {
        let concurrency = self.config.concurrency.max(1);
        debug!(
            "Requesting {} embeddings with concurrency {concurrency}",
            self.corpus.len()
        );

        stream::iter(self.corpus.items())
            .map(|item| async move {
                let key = item.key();
                let response = self
                    .provider
                    .embed(self.request_for(&item.description))
                    .await
                    .map_err(|source| RankerError::Provider {
                        key: key.clone(),
                        source,
                    })?;
                debug!("Embedded '{key}' ({} dimensions)", response.dimension);
                Ok::<_, RankerError>((key, response.embedding))
            })
            .buffered(concurrency)
            .try_collect()
            .await
    }

    fn request_for(&self, text: &str) -> EmbeddingRequest {
        let mut request = EmbeddingRequest::new(text);
        if let Some(ref model) = self.config.model {
            request = request.with_model(model.clone());
        }
        if let Some(dimensions) = self.config.dimensions {
            request = request.with_dimensions(dimensions);
        }
        request
    }

    fn ensure_embedded(&self) -> Result<()> {
        if self.state != RankerState::Embedded {
            return Err(RankerError::NotReady { state: self.state });
        }
        Ok(())
    }

    /// Rank every other item by similarity to the named target.
    ///
    /// Results are sorted by descending cosine similarity; equal scores keep
    /// corpus order. The target itself is not included.
    pub fn rank(&self, target: &str) -> Result<Vec<RankedResult>> {
        self.ensure_embedded()?;

        let key = normalize_key(target);
        let target_embedding = self
            .cache
            .get(&key)
            .ok_or_else(|| RankerError::UnknownTarget(target.trim().to_string()))?;

        debug!("Ranking {} items against '{key}'", self.corpus.len() - 1);

        let candidates = self.corpus.items().iter().filter(|item| item.key() != key);
        self.score(&key, target_embedding, candidates)
    }

    /// Rank every item by similarity to an ad-hoc text.
    pub async fn rank_text(&self, text: &str) -> Result<Vec<RankedResult>> {
        self.ensure_embedded()?;

        let response = self
            .provider
            .embed(self.request_for(text))
            .await
            .map_err(|source| RankerError::Provider {
                key: QUERY_KEY.to_string(),
                source,
            })?;

        self.score(QUERY_KEY, &response.embedding, self.corpus.items().iter())
    }

    fn score<'a>(
        &self,
        query_key: &str,
        query: &[f32],
        candidates: impl Iterator<Item = &'a Item>,
    ) -> Result<Vec<RankedResult>> {
        let query_magnitude = magnitude(query);
        if query_magnitude == 0.0 {
            return Err(RankerError::ZeroMagnitude {
                key: query_key.to_string(),
            });
        }

        let mut results = Vec::new();
        for item in candidates {
            let key = item.key();
            let embedding = self
                .cache
                .get(&key)
                .ok_or(RankerError::NotReady { state: self.state })?;

            let dot = dot_product(query, embedding).map_err(|e| comparison_error(&key, e))?;
            let cosine = cosine_from_parts(dot, query_magnitude, magnitude(embedding))
                .map_err(|e| comparison_error(&key, e))?;

            results.push(RankedResult {
                name: item.name.clone(),
                dot,
                cosine,
            });
        }

        // Stable: ties stay in corpus order.
        results.sort_by_key(|r| Reverse(OrderedFloat(r.cosine)));
        Ok(results)
    }
}

fn comparison_error(key: &str, err: EmbeddingError) -> RankerError {
    match err {
        EmbeddingError::DimensionMismatch { expected, actual } => RankerError::DimensionMismatch {
            key: key.to_string(),
            expected,
            actual,
        },
        EmbeddingError::ZeroMagnitude => RankerError::ZeroMagnitude {
            key: key.to_string(),
        },
        source => RankerError::Provider {
            key: key.to_string(),
            source,
        },
    }
}
