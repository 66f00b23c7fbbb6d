//! # ESG Radar
//!
//! An ESG news radar that discovers environmental and indoor-air-quality
//! articles, summarizes them with a local language model, and serves the
//! results over a small read API.
//!
//! ## Features
//!
//! - Discovers candidate articles from keyword web search and a fixed RSS
//!   feed list
//! - Extracts paragraph text, gates it against two keyword priority tiers,
//!   and mines the publishing company from page metadata
//! - Summarizes and titles accepted articles through a local Ollama
//!   instance, formatting the output into structured markup
//! - Persists reports and harvested page images in SQLite
//! - Serves stored reports, summaries, and images as JSON plus an HTML
//!   gallery view
//!
//! ## Usage
//!
//! ```sh
//! esg_radar scrape            # run one ingestion batch
//! esg_radar serve             # start the read API
//! esg_radar reset             # drop and recreate the tables
//! ```
//!
//! ## Architecture
//!
//! The `scrape` subcommand runs a sequential pipeline per candidate URL:
//! 1. **Discovery**: keyword web search, then the configured RSS feeds
//! 2. **Dedup**: skip URLs already stored (exact string match)
//! 3. **Extraction**: fetch the page, keep paragraph text over 40 characters
//! 4. **Gating**: two-tier case-insensitive keyword match
//! 5. **Summarization**: local generation service, best-effort
//! 6. **Persistence**: one commit per accepted article, then image harvest

use clap::Parser;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod db;
mod extract;
mod format;
mod images;
mod keywords;
mod models;
mod pipeline;
mod server;
mod sources;
mod summarizer;
mod utils;

use cli::{Cli, Command};
use db::Store;
use summarizer::OllamaClient;

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args.config, "Parsed CLI arguments");

    let config = config::load(args.config.as_deref())?;
    let store = Store::open(&config.database_path)?;

    match args.command {
        Command::Scrape => {
            info!("esg_radar scrape starting");
            let summarizer = OllamaClient::new(config.generation.clone())?;
            let stats = pipeline::run(&store, &config, &summarizer).await?;
            info!(
                web_added = stats.web_added,
                rss_added = stats.rss_added,
                "Scrape finished"
            );
        }
        Command::Serve => {
            server::serve(store, &config).await?;
        }
        Command::Reset => {
            store.reset()?;
            info!(path = %config.database_path, "Database reset: all tables dropped and recreated");
        }
    }

    Ok(())
}
