//! Subcommand implementations.
//!
//! Each command has a session function that is generic over its input and
//! output so it can be driven from tests without a terminal.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use simrank_embeddings::{CachedProvider, EmbeddingProvider, EmbeddingStore, OpenAIProvider};
use simrank_ranker::{Corpus, RankerError, SimilarityRanker, render_report};
use simrank_retrieval::{
    ChatProvider, ChatRequest, InMemoryVectorStore, OpenAIChatProvider, RetrievalAgent,
    VectorStore,
};

use crate::cli::{AskArgs, ChatArgs, RankArgs};
use crate::config::AppConfig;

/// Maximum entries kept in the persistent embedding cache.
const CACHE_MAX_ENTRIES: usize = 10_000;

/// Prompt printed before reading the target item.
pub const TARGET_PROMPT: &str = "Enter target item: ";

/// Build the embedding provider described by the config, behind the
/// persistent cache when one is configured.
pub async fn build_embedder(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let mut provider = OpenAIProvider::new()
        .with_base_url(&config.base_url)
        .with_model(&config.embedding_model)
        .with_timeout(config.request_timeout());
    if let Some(ref key) = config.api_key {
        provider = provider.with_api_key(key);
    }

    match config.cache_file {
        Some(ref path) => {
            let store = EmbeddingStore::with_persistence(path, CACHE_MAX_ENTRIES)
                .await
                .with_context(|| format!("failed to open embedding cache {}", path.display()))?;
            info!("Using embedding cache at {}", path.display());
            Ok(Arc::new(CachedProvider::new(provider, store)))
        }
        None => Ok(Arc::new(provider)),
    }
}

/// Build the chat provider described by the config.
pub fn build_chat(config: &AppConfig) -> OpenAIChatProvider {
    let mut chat = OpenAIChatProvider::new()
        .with_base_url(&config.base_url)
        .with_model(&config.chat_model)
        .with_timeout(config.request_timeout());
    if let Some(ref key) = config.api_key {
        chat = chat.with_api_key(key);
    }
    chat
}

/// `simrank rank`: load and embed the corpus, then print one report.
pub async fn rank(config: &AppConfig, args: RankArgs) -> Result<()> {
    let corpus = Corpus::from_path(&args.corpus)
        .with_context(|| format!("failed to load corpus {}", args.corpus.display()))?;

    let embedder = build_embedder(config).await?;
    let mut ranker = SimilarityRanker::with_config(embedder, config.ranker_config());
    ranker.load(corpus);
    ranker
        .embed_all()
        .await
        .context("failed to embed the corpus")?;

    let mut stdout = std::io::stdout();
    if let Some(query) = args.query {
        let results = ranker.rank_text(&query).await?;
        write!(stdout, "{}", render_report(&query, &results))?;
        return Ok(());
    }

    let stdin = BufReader::new(tokio::io::stdin());
    run_rank_session(&ranker, args.target.as_deref(), stdin, &mut stdout).await
}

/// Ask for a target (unless one is given), rank against it and print the
/// report.
///
/// An unknown target prints `Item not found: <target>` and still succeeds.
pub async fn run_rank_session<P, R, W>(
    ranker: &SimilarityRanker<P>,
    target: Option<&str>,
    mut input: R,
    out: &mut W,
) -> Result<()>
where
    P: EmbeddingProvider,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let target = match target {
        Some(target) => target.to_string(),
        None => {
            write!(out, "{TARGET_PROMPT}")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                bail!("no target item given");
            }
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    match ranker.rank(&target) {
        Ok(results) => write!(out, "{}", render_report(&target, &results))?,
        Err(RankerError::UnknownTarget(name)) => writeln!(out, "Item not found: {name}")?,
        Err(err) => return Err(err.into()),
    }
    out.flush()?;
    Ok(())
}

/// `simrank ask`: ingest a document and answer questions about it.
pub async fn ask(config: &AppConfig, args: AskArgs) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.document)
        .await
        .with_context(|| format!("failed to read {}", args.document.display()))?;

    let embedder = build_embedder(config).await?;
    let mut agent = RetrievalAgent::new(
        embedder,
        build_chat(config),
        InMemoryVectorStore::new(),
        config.retrieval_config(),
    )?;

    let source = args.document.display().to_string();
    let added = agent.ingest(&text, &source).await?;
    if added == 0 {
        bail!("{source} has no text to answer from");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_ask_session(&agent, args.questions, stdin, &mut stdout).await
}

/// Answer each question in turn, printing `Q:`/`A:` pairs.
///
/// With no questions given, questions are read from `input` one per line
/// until end of input; blank lines are skipped.
pub async fn run_ask_session<E, C, S, R, W>(
    agent: &RetrievalAgent<E, C, S>,
    questions: Vec<String>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    E: EmbeddingProvider,
    C: ChatProvider,
    S: VectorStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if !questions.is_empty() {
        for question in questions {
            answer_one(agent, &question, out).await?;
        }
        return Ok(());
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        answer_one(agent, question, out).await?;
    }
    Ok(())
}

async fn answer_one<E, C, S, W>(
    agent: &RetrievalAgent<E, C, S>,
    question: &str,
    out: &mut W,
) -> Result<()>
where
    E: EmbeddingProvider,
    C: ChatProvider,
    S: VectorStore,
    W: Write,
{
    let answer = agent.answer(question).await?;
    debug!("Answer used {} sources", answer.sources.len());
    writeln!(out, "Q: {question}")?;
    writeln!(out, "A: {}", answer.text.trim())?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// `simrank chat`: print the model's reply to one prompt.
pub async fn chat(config: &AppConfig, args: ChatArgs) -> Result<()> {
    let provider = build_chat(config);
    let response = provider
        .complete(ChatRequest::from_prompt(args.prompt))
        .await?;
    println!("{}", response.content);
    Ok(())
}
