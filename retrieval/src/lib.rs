//! # Retrieval Agent
//!
//! Answers questions about one document by retrieving its most relevant
//! chunks and handing them to a chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Retrieval-Augmented Answers                    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  Document ──► TextSplitter ──► EmbeddingProvider                │
//! │                                       │                          │
//! │                                       ▼                          │
//! │                               ┌──────────────┐                   │
//! │  Question ──────────────────► │ VectorStore  │                   │
//! │                               └──────────────┘                   │
//! │                                       │ top-k chunks             │
//! │                                       ▼                          │
//! │                               ┌──────────────┐                   │
//! │                               │ ChatProvider │ ──► Answer        │
//! │                               └──────────────┘                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use simrank_retrieval::{InMemoryVectorStore, RetrievalAgent, RetrievalConfig};
//!
//! let store = InMemoryVectorStore::new();
//! let mut agent = RetrievalAgent::new(embedder, chat, store, RetrievalConfig::default());
//! agent.ingest(&text, "resume.txt").await?;
//!
//! let answer = agent.answer("What technologies does this person know?").await?;
//! println!("{}", answer.text);
//! ```

pub mod agent;
pub mod chat;
pub mod chunker;
pub mod config;
pub mod error;
pub mod store;

pub use agent::{Answer, RetrievalAgent, build_prompt};
pub use chat::{
    ChatMessage, ChatProvider, ChatRequest, ChatResponse, ChatRole, DEFAULT_CHAT_MODEL,
    OpenAIChatProvider,
};
pub use chunker::TextSplitter;
pub use config::{ChunkerConfig, RetrievalConfig};
pub use error::{Result, RetrievalError};
pub use store::{Document, InMemoryVectorStore, ScoredDocument, VectorStore};
