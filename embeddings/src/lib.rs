//! # Embeddings
//!
//! This crate provides embedding generation and vector math for simrank.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors through a hosted API
//! - **Vector Math**: Dot product, magnitude and cosine similarity with checked
//!   dimensions and magnitudes
//! - **Caching**: Memoize embeddings by model and text, optionally on disk
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► similarity                │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  OpenAIProvider ◄── CachedProvider ──► CacheEntry (JSON)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod provider;
pub mod similarity;

pub use cache::{CacheStats, CachedProvider, EmbeddingStore};
pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider};
pub use similarity::{cosine_from_parts, cosine_similarity, dot_product, magnitude};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Base URL of the OpenAI REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
