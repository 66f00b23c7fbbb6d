//! Command-line interface definitions for the ESG radar.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. The config path can be provided via flag or environment variable.

use clap::{Parser, Subcommand};

/// Command-line arguments for the ESG radar binary.
///
/// One binary, three subcommands: `scrape` runs a single ingestion batch,
/// `serve` starts the read API, and `reset` drops and recreates the
/// database tables.
///
/// # Examples
///
/// ```sh
/// # One ingestion batch with the default configuration
/// esg_radar scrape
///
/// # Read API with a custom config file
/// esg_radar --config ./config.yaml serve
///
/// # Wipe the database
/// esg_radar reset
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, env = "ESG_RADAR_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one ingestion batch: web search discovery, then the RSS feeds
    Scrape,
    /// Start the HTTP read API
    Serve,
    /// Drop and recreate both database tables, discarding all rows
    Reset,
}
