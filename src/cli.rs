//! CLI definition
//!
//! Command-line interface for one-shot search, interactive search and the
//! HTTP server

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Site search CLI
#[derive(Parser, Debug)]
#[command(name = "sitesearch")]
#[command(about = "Fuzzy search over a static site's index, plus its form relay", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to sitesearch/config.json in the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one query and print the rendered results
    Search(SearchArgs),
    /// Interactive search: each stdin line is the new input value
    Watch(WatchArgs),
    /// Serve the search route and the form endpoints
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Json,
}

/// Search command arguments
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Index URL or path to index.json
    #[arg(short = 'i', long)]
    pub index: Option<String>,

    /// Search terms
    #[arg(short = 'q', long)]
    pub query: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,
}

/// Watch command arguments
#[derive(Parser, Debug, Clone)]
pub struct WatchArgs {
    /// Index URL or path to index.json
    #[arg(short = 'i', long)]
    pub index: Option<String>,

    /// Page URL whose `q` parameter pre-fills the search
    #[arg(short = 'u', long)]
    pub url: Option<String>,
}

/// Serve command arguments
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Index URL or path to index.json
    #[arg(short = 'i', long)]
    pub index: Option<String>,

    /// Listen address (default 127.0.0.1:8080)
    #[arg(short = 'b', long)]
    pub bind: Option<SocketAddr>,
}
