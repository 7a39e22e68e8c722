//! Question answering over ingested documents.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use simrank_embeddings::{EmbeddingProvider, EmbeddingRequest};

use crate::chat::{ChatProvider, ChatRequest};
use crate::chunker::TextSplitter;
use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::store::{Document, ScoredDocument, VectorStore};

/// An answer with the chunks it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The question that was asked.
    pub question: String,

    /// The chat model's reply.
    pub text: String,

    /// Retrieved chunks, best first.
    pub sources: Vec<ScoredDocument>,
}

/// Build the prompt that restricts the model to the retrieved context.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an AI Agent.\n\
         Answer the question using ONLY the information from the context.\n\
         If the answer is not present, say \"I don't know\".\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n"
    )
}

/// Retrieval-augmented question answering.
///
/// Documents are split with a [`TextSplitter`], embedded, and kept in a
/// [`VectorStore`]. Each question retrieves the `top_k` closest chunks and
/// asks the chat model to answer from them alone.
pub struct RetrievalAgent<E, C, S> {
    embedder: E,
    chat: C,
    store: S,
    splitter: TextSplitter,
    config: RetrievalConfig,
}

impl<E, C, S> RetrievalAgent<E, C, S>
where
    E: EmbeddingProvider,
    C: ChatProvider,
    S: VectorStore,
{
    /// Create a new agent.
    pub fn new(embedder: E, chat: C, store: S, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        let splitter = TextSplitter::new(config.chunker)?;
        Ok(Self {
            embedder,
            chat,
            store,
            splitter,
            config,
        })
    }

    /// The vector store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Chunk, embed and store a document. Returns the number of chunks added.
    ///
    /// Embedding stops at the first failure; chunks are only stored once
    /// every one of them has an embedding the store accepts.
    pub async fn ingest(&mut self, text: &str, source: &str) -> Result<usize> {
        let chunks = self.splitter.split(text);
        if chunks.is_empty() {
            info!("Document {source} has no text to ingest");
            return Ok(0);
        }

        let concurrency = self.config.concurrency.max(1);
        debug!(
            "Embedding {} chunks from {source} with concurrency {concurrency}",
            chunks.len()
        );

        let embedder = &self.embedder;
        let embeddings: Vec<_> = stream::iter(chunks.iter())
            .map(|chunk| async move {
                embedder
                    .embed(EmbeddingRequest::new(chunk.as_str()))
                    .await
                    .map(|response| response.embedding)
            })
            .buffered(concurrency)
            .try_collect()
            .await?;

        let count = chunks.len();
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk, embedding))| {
                let document = Document::new(chunk)
                    .with_source(source)
                    .with_chunk_index(index);
                (document, embedding)
            })
            .collect();
        self.store.add_all(entries)?;

        info!("Ingested {count} chunks from {source}");
        Ok(count)
    }

    /// Retrieve the chunks most relevant to a question.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredDocument>> {
        if self.store.is_empty() {
            return Err(RetrievalError::EmptyStore);
        }

        let query = self
            .embedder
            .embed(EmbeddingRequest::new(question))
            .await?
            .embedding;

        self.store.similarity_search(&query, self.config.top_k)
    }

    /// Answer a question from the ingested documents.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let sources = self.retrieve(question).await?;

        let context = sources
            .iter()
            .map(|s| s.document.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut request = ChatRequest::from_prompt(build_prompt(&context, question))
            .with_temperature(self.config.temperature);
        if let Some(ref model) = self.config.chat_model {
            request = request.with_model(model.clone());
        }

        let response = self.chat.complete(request).await?;
        debug!(
            "Answered with {} context chunks using {}",
            sources.len(),
            response.model
        );

        Ok(Answer {
            question: question.to_string(),
            text: response.content,
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("Knows Rust.\n\nKnows Go.", "Does the candidate know Python?");

        assert!(prompt.starts_with("You are an AI Agent.\n"));
        assert!(prompt.contains("say \"I don't know\""));
        assert!(prompt.contains("Context:\nKnows Rust.\n\nKnows Go.\n\nQuestion:\n"));
        assert!(prompt.ends_with("Does the candidate know Python?\n"));
    }
}
