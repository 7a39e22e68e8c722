//! # Similarity Ranker
//!
//! Ranks the items of a small corpus by how similar their embeddings are to
//! one target item.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Similarity Ranker                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Corpus ──► SimilarityRanker ──► EmbeddingProvider             │
//! │                  │                      │                       │
//! │                  ▼                      ▼                       │
//! │           Vec<RankedResult> ◄── EmbeddingCache                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use simrank_ranker::{Corpus, SimilarityRanker};
//!
//! let corpus = Corpus::from_path("fruits.json")?;
//! let mut ranker = SimilarityRanker::new(provider);
//! ranker.load_corpus(corpus.into_items())?;
//! ranker.embed_all().await?;
//!
//! for result in ranker.rank("Apple")? {
//!     println!("{} {:.4}", result.name, result.cosine);
//! }
//! ```

pub mod cache;
pub mod corpus;
pub mod error;
pub mod ranker;
pub mod report;

pub use cache::EmbeddingCache;
pub use corpus::{Corpus, Item, normalize_key};
pub use error::{RankerError, Result};
pub use ranker::{RankedResult, RankerConfig, RankerState, SimilarityRanker};
pub use report::render_report;
