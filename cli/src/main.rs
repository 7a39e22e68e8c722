//! simrank - rank a corpus by embedding similarity.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use simrank_cli::{AppConfig, Cli, Commands, commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the reports.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    dotenvy::dotenv().ok();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.cache_file {
        config.cache_file = Some(path);
    }

    match cli.command {
        Commands::Rank(args) => commands::rank(&config, args).await,
        Commands::Ask(args) => commands::ask(&config, args).await,
        Commands::Chat(args) => commands::chat(&config, args).await,
    }
}
