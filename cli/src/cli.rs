//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Rank items by embedding similarity and ask questions about documents.
#[derive(Parser, Debug)]
#[command(name = "simrank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON file for the persistent embedding cache.
    #[arg(long, global = true)]
    pub cache_file: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank the corpus by similarity to one of its items.
    Rank(RankArgs),

    /// Answer questions about a plain-text document.
    Ask(AskArgs),

    /// Send a single prompt to the chat model.
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Corpus file: a JSON array of {id, name, description}.
    #[arg(default_value = "fruits.json")]
    pub corpus: PathBuf,

    /// Target item; prompted for on stdin when omitted.
    #[arg(short, long, conflicts_with = "query")]
    pub target: Option<String>,

    /// Rank every item against free text instead of a corpus item.
    #[arg(short, long)]
    pub query: Option<String>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Plain-text document to answer from.
    pub document: PathBuf,

    /// Questions to ask; read from stdin, one per line, when omitted.
    pub questions: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Prompt to send.
    pub prompt: String,
}
