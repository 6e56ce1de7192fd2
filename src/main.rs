//! sitesearch: site search core and form relay (Rust)
//!
//! Commands:
//! - `search` - one query against a search index, rendered as HTML or JSON
//! - `watch` - interactive, debounced search driven by stdin lines
//! - `serve` - HTTP server with `GET /search` and the contact/subscribe relay

mod cli;
mod config;
mod error;
mod forms;
mod http;
mod search;
mod server;
mod watch;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use config::SiteConfig;
use error::{validate_query, AppError};
use search::{load_index, search_and_render, FieldMatch, IndexSource};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags; RUST_LOG wins when set
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
        Err(e) => {
            if let Some(app) = e.downcast_ref::<AppError>() {
                error!(code = app.error_code(), "Command failed");
            }
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = config::load_config(cli.config.as_deref())?;
    let client = http::client_with_timeout(Duration::from_secs(config.timeout_secs))?;

    match cli.command {
        Commands::Search(args) => execute_search_cli(args, &config, &client).await,
        Commands::Watch(args) => execute_watch_cli(args, &config, &client).await,
        Commands::Serve(args) => execute_serve_cli(args, config, client).await,
    }
}

/// Index source from the flag, falling back to configuration
fn resolve_index(flag: Option<String>, config: &SiteConfig) -> Result<IndexSource, AppError> {
    let raw = flag.or_else(|| config.index.clone()).ok_or_else(|| {
        AppError::InvalidInput(
            "No search index given; pass --index or set SITESEARCH_INDEX".to_string(),
        )
    })?;
    Ok(raw.parse().unwrap_or_else(|never| match never {}))
}

#[derive(Debug, Serialize)]
struct JsonHit<'a> {
    /// Position of the document in the index
    index: usize,
    title: &'a str,
    permalink: &'a str,
    score: f64,
    relevance: u32,
    matches: &'a [FieldMatch],
}

/// Execute search command in CLI mode
async fn execute_search_cli(
    args: cli::SearchArgs,
    config: &SiteConfig,
    client: &reqwest::Client,
) -> Result<String> {
    validate_query(&args.query)?;
    let source = resolve_index(args.index, config)?;
    let context = load_index(&source, client).await.map_err(AppError::from)?;
    let query = args.query.trim();

    match args.format {
        OutputFormat::Html => {
            let rendered = search_and_render(&context, query);
            Ok(format!("{}\n{}", rendered.stats, rendered.results_html.trim_end()))
        }
        OutputFormat::Json => {
            let results = context.search(query);
            let hits: Vec<JsonHit<'_>> = results
                .iter()
                .map(|r| JsonHit {
                    index: r.ref_index,
                    title: &r.item.title,
                    permalink: &r.item.permalink,
                    score: r.score,
                    relevance: search::relevance_percent(r.score),
                    matches: &r.matches,
                })
                .collect();
            Ok(serde_json::to_string_pretty(&hits)?)
        }
    }
}

/// Execute watch command: interactive search over stdin
async fn execute_watch_cli(
    args: cli::WatchArgs,
    config: &SiteConfig,
    client: &reqwest::Client,
) -> Result<String> {
    let source = resolve_index(args.index, config)?;
    let loaded = load_index(&source, client).await.map(Arc::new);

    let controller = watch::run(
        loaded,
        args.url.as_deref(),
        watch::stdin_events(),
        std::io::stdout(),
    )
    .await;

    info!(
        "Session ended after {} searches, last query {:?}",
        controller.searches_run(),
        controller.last_query().unwrap_or("")
    );
    Ok(String::new())
}

/// Execute serve command: HTTP server until interrupted
async fn execute_serve_cli(
    args: cli::ServeArgs,
    config: SiteConfig,
    client: reqwest::Client,
) -> Result<String> {
    let source = resolve_index(args.index, &config)?;
    let search = match load_index(&source, &client).await {
        Ok(context) => {
            info!(
                "Search ready: {} documents from {}",
                context.documents().len(),
                context.source()
            );
            Some(Arc::new(context))
        }
        Err(e) => {
            error!("Search disabled: {}", e);
            None
        }
    };

    let addr: SocketAddr = match args.bind {
        Some(addr) => addr,
        None => config.bind.parse().map_err(|e| {
            AppError::Config(format!("Invalid bind address {:?}: {}", config.bind, e))
        })?,
    };

    let state = server::AppState {
        search,
        forms: forms::FormsState::new(config.forms, client),
    };
    server::serve(addr, state).await?;
    Ok(String::new())
}

/// Map errors to exit codes
fn get_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(app) = err.downcast_ref::<AppError>() {
        return app.exit_code();
    }

    let err_str = err.to_string().to_lowercase();
    if err_str.contains("invalid") || err_str.contains("usage") {
        1 // Invalid arguments or usage error
    } else if err_str.contains("network") || err_str.contains("connection") {
        2 // Network or API error
    } else if err_str.contains("timeout") {
        4 // Timeout error
    } else {
        5 // Other application errors
    }
}
