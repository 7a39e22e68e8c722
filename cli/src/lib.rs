//! # simrank CLI
//!
//! Library half of the `simrank` binary: argument definitions, layered
//! configuration and the `rank`, `ask` and `chat` commands.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{AskArgs, ChatArgs, Cli, Commands, RankArgs};
pub use commands::{TARGET_PROMPT, run_ask_session, run_rank_session};
pub use config::{AppConfig, ConfigError, RetrievalSettings};
