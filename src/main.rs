//! # dossier CLI
//!
//! The `dossier` binary manages a person-scoped document store: uploaded
//! files live on disk under one directory per person, rows live in SQLite,
//! and descriptions come from an external summarization API when one is
//! configured.
//!
//! ## Usage
//!
//! ```bash
//! dossier --config ./config/dossier.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dossier init` | Create the SQLite database and run schema migrations |
//! | `dossier serve` | Start the HTTP server |
//! | `dossier search [term]` | List people and documents, optionally filtered |
//! | `dossier describe <path>` | Run the description pipeline on a local file |

mod catalog;
mod config;
mod db;
mod describe;
mod extract;
mod ingest;
mod migrate;
mod models;
mod search;
mod server;
mod storage;
mod summarize;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A small document management service with AI descriptions.
#[derive(Parser)]
#[command(
    name = "dossier",
    about = "dossier — person-scoped document storage with AI-generated descriptions",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dossier.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite file and the `people`/`documents` tables.
    /// Running it multiple times is safe.
    Init,

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves upload, listing/search, view,
    /// and delete endpoints.
    Serve,

    /// List people and their documents.
    ///
    /// With a term, applies the same case-insensitive substring search the
    /// web surface uses; without one, prints the full listing.
    Search {
        /// Search term matched against person names/ids and document
        /// names, categories, and descriptions.
        term: Option<String>,
    },

    /// Run the description pipeline on a local file and print the result.
    ///
    /// Useful for checking extraction and API credentials without going
    /// through an upload.
    Describe {
        /// Path to a local file; its extension picks the extractor.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { term } => {
            search::run_search(&cfg, term.as_deref().unwrap_or_default()).await?;
        }
        Commands::Describe { path } => {
            let summarizer = summarize::Summarizer::from_config(&cfg.summarizer)?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let outcome = describe::describe(summarizer.as_ref(), &path, &filename).await;
            println!("{}", outcome.into_description());
        }
    }

    Ok(())
}
