//! Interactive sessions driven with in-memory input and output.

use std::collections::HashMap;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use simrank_cli::{TARGET_PROMPT, run_ask_session, run_rank_session};
use simrank_embeddings::{EmbeddingError, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use simrank_ranker::{Item, SimilarityRanker};
use simrank_retrieval::{
    ChatProvider, ChatRequest, ChatResponse, ChunkerConfig, InMemoryVectorStore, RetrievalAgent,
    RetrievalConfig,
};

/// Returns a fixed vector per input text.
struct TableProvider {
    vectors: HashMap<String, Vec<f32>>,
}

impl TableProvider {
    fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, vector)| ((*text).to_string(), vector.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TableProvider {
    fn name(&self) -> &str {
        "table"
    }

    fn default_model(&self) -> &str {
        "table"
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> simrank_embeddings::Result<EmbeddingResponse> {
        self.vectors
            .get(&request.text)
            .map(|v| EmbeddingResponse::new(v.clone(), "table"))
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse(format!("no vector for {}", request.text))
            })
    }

    fn is_available(&self) -> bool {
        true
    }
}

async fn fruit_ranker() -> SimilarityRanker<TableProvider> {
    let provider = TableProvider::new(&[
        ("red fruit", vec![1.0, 0.0, 0.0]),
        ("citrus fruit", vec![0.9, 0.1, 0.0]),
        ("root vegetable", vec![0.0, 0.0, 1.0]),
    ]);
    let mut ranker = SimilarityRanker::new(provider);
    ranker
        .load_corpus(vec![
            Item::new("1", "Apple", "red fruit"),
            Item::new("2", "Orange", "citrus fruit"),
            Item::new("3", "Carrot", "root vegetable"),
        ])
        .unwrap();
    ranker.embed_all().await.unwrap();
    ranker
}

#[tokio::test]
async fn test_rank_session_prints_report() {
    let ranker = fruit_ranker().await;
    let mut out = Vec::new();

    run_rank_session(&ranker, None, "apple\n".as_bytes(), &mut out)
        .await
        .unwrap();

    let expected = format!(
        "{TARGET_PROMPT}\nTarget: apple\n\n\
         1. Orange\n   Dot Product      : 0.90\n   Cosine Similarity: 0.9939\n\n\
         2. Carrot\n   Dot Product      : 0.00\n   Cosine Similarity: 0.0000\n\n"
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[tokio::test]
async fn test_rank_session_unknown_target() {
    let ranker = fruit_ranker().await;
    let mut out = Vec::new();

    run_rank_session(&ranker, None, "Banana\r\n".as_bytes(), &mut out)
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!("{TARGET_PROMPT}Item not found: Banana\n")
    );
}

#[tokio::test]
async fn test_rank_session_with_target_skips_prompt() {
    let ranker = fruit_ranker().await;
    let mut out = Vec::new();

    run_rank_session(&ranker, Some("Carrot"), "".as_bytes(), &mut out)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("\nTarget: Carrot\n\n1. Apple\n"));
    assert!(!out.contains(TARGET_PROMPT));
}

#[tokio::test]
async fn test_rank_session_end_of_input() {
    let ranker = fruit_ranker().await;
    let mut out = Vec::new();

    let result = run_rank_session(&ranker, None, "".as_bytes(), &mut out).await;
    assert!(result.is_err());
}

/// Echoes the question back.
struct EchoChat;

#[async_trait]
impl ChatProvider for EchoChat {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: ChatRequest) -> simrank_retrieval::Result<ChatResponse> {
        let prompt = &request.messages[0].content;
        let question = prompt
            .lines()
            .last()
            .unwrap_or_default()
            .to_string();
        Ok(ChatResponse {
            content: format!("You asked: {question}\n"),
            model: "echo".to_string(),
            tokens_used: None,
        })
    }
}

/// Every text maps to the same direction.
struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    fn name(&self) -> &str {
        "constant"
    }

    fn default_model(&self) -> &str {
        "constant"
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> simrank_embeddings::Result<EmbeddingResponse> {
        Ok(EmbeddingResponse::new(vec![1.0, 1.0], "constant"))
    }

    fn is_available(&self) -> bool {
        true
    }
}

async fn echo_agent() -> RetrievalAgent<ConstantEmbedder, EchoChat, InMemoryVectorStore> {
    let config = RetrievalConfig::default()
        .with_chunker(ChunkerConfig::new(100, 10))
        .with_top_k(1);
    let mut agent =
        RetrievalAgent::new(ConstantEmbedder, EchoChat, InMemoryVectorStore::new(), config)
            .unwrap();
    agent
        .ingest("Knows Rust.\n\nKnows Go.", "resume.txt")
        .await
        .unwrap();
    agent
}

#[tokio::test]
async fn test_ask_session_reads_questions_from_input() {
    let agent = echo_agent().await;
    let mut out = Vec::new();

    run_ask_session(
        &agent,
        Vec::new(),
        "Rust?\n\n   \nGo?\n".as_bytes(),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Q: Rust?\nA: You asked: Rust?\n\nQ: Go?\nA: You asked: Go?\n\n"
    );
}

#[tokio::test]
async fn test_ask_session_prefers_given_questions() {
    let agent = echo_agent().await;
    let mut out = Vec::new();

    run_ask_session(
        &agent,
        vec!["Python?".to_string()],
        "ignored\n".as_bytes(),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Q: Python?\nA: You asked: Python?\n\n"
    );
}
