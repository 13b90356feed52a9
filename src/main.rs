//! sync-viewer - command-line client for the go-sync review server
//!
//! # Usage
//! ```bash
//! sync-viewer login alice secret         # Prints a session token
//! export SYNC_VIEWER_TOKEN=<token>
//! sync-viewer repos                      # List configured repositories
//! sync-viewer commits 1 --index 2        # Page through history
//! sync-viewer revert 1 abc123 a.txt      # Restore files to a commit
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sync_viewer::config::TOKEN_ENV;
use sync_viewer::models::{CommitsQuery, Credentials, LoginToken, Pager, Repository, RevertRequest};
use sync_viewer::{ClientConfig, ClientError, Navigator, Notifier, ReviewApi, Transport};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// sync-viewer - browse and restore history on a go-sync server
#[derive(Parser)]
#[command(name = "sync-viewer")]
#[command(about = "Command-line client for the go-sync review server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL prefix [default: $SYNC_VIEWER_API_PREFIX, then http://127.0.0.1:8080/api]
    #[arg(long, global = true)]
    api: Option<String>,

    /// Session token from a previous login [default: $SYNC_VIEWER_TOKEN]
    #[arg(long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the session token
    Login { username: String, password: String },
    /// List configured repositories
    Repos,
    /// Show one page of commit history
    Commits {
        /// Repository id (1-based position in `repos`)
        id: i64,
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        index: u32,
        /// Commits per page
        #[arg(short, long, default_value = "20")]
        size: u32,
    },
    /// Restore files to their content at a commit (all files if none given)
    Revert {
        id: i64,
        hash: String,
        files: Vec<String>,
    },
}

struct Console;

impl Notifier for Console {
    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }
}

impl Navigator for Console {
    fn navigate(&self, _path: &str) {
        eprintln!("  Session expired or missing.");
        eprintln!("  Run 'sync-viewer login <USERNAME> <PASSWORD>' and export {}.", TOKEN_ENV);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = apply_overrides(ClientConfig::from_env(), cli.api, cli.token);

    let console = Arc::new(Console);
    let transport = Transport::builder(config)
        .notifier(console.clone())
        .navigator(console)
        .build()
        .context("failed to set up HTTP client")?;
    let api = ReviewApi::new(transport);

    // Ctrl+C abandons the in-flight call
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match run(&api, cli.command, cancel).await {
        Ok(()) => Ok(()),
        Err(ClientError::Cancelled) => {
            eprintln!("\n  Cancelled.");
            std::process::exit(130);
        }
        // the transport already printed the server's message
        Err(e) if e.code().is_some() || matches!(e, ClientError::Transport { .. }) => std::process::exit(1),
        Err(e) => Err(e.into()),
    }
}

/// Command-line flags win over the environment.
fn apply_overrides(mut config: ClientConfig, api: Option<String>, token: Option<String>) -> ClientConfig {
    if let Some(api) = api {
        config.base_url = api;
    }
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        config = config.with_token(token);
    }
    config
}

async fn run(api: &ReviewApi, command: Commands, cancel: CancellationToken) -> sync_viewer::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let token: LoginToken = api.login(&Credentials::new(username, password)).await?;
            println!("✓ Logged in");
            println!("{}", token);
        }
        Commands::Repos => {
            let repos: Vec<Repository> = api.list_repositories().await?;
            if repos.is_empty() {
                println!("No repositories configured");
            }
            for (i, repo) in repos.iter().enumerate() {
                println!("{:>3}  {}  ({})", i + 1, repo.name, repo.path);
                if !repo.url.is_empty() {
                    println!("     {} [{}]", repo.url, repo.branch);
                }
            }
        }
        Commands::Commits { id, index, size } => {
            let query = CommitsQuery {
                repository_id: id,
                pager: Pager::page(index, size),
            };
            let page = api.list_commits_cancellable(&query, cancel).await?;
            for commit in &page.list {
                println!(
                    "{}  {}  {:<16}  {}",
                    commit.short_hash(),
                    commit.date,
                    commit.author,
                    commit.summary()
                );
            }
            println!();
            println!(
                "  Page {} of {} ({} commits)",
                index,
                page.page_count(size),
                page.total
            );
        }
        Commands::Revert { id, hash, files } => {
            let request = RevertRequest::new(id, hash, files);
            api.revert(&request).await?;
            if request.files.is_empty() {
                println!("✓ Restored all files to {}", request.hash);
            } else {
                println!("✓ Restored {} file(s) to {}", request.files.len(), request.hash);
            }
        }
    }
    Ok(())
}
