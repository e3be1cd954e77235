//! CLI module for the semantic document cache
//!
//! Operator commands wired from configuration:
//! - `init-index`: create the secondary index structures
//! - `seed`: load documents from a JSON-lines file without deduplication
//! - `ingest`: embed a text file and admit its paragraphs
//! - `query`: embed a text and print its nearest cached documents
//! - `reset`: drop every cached document

pub mod index;
pub mod ingest;
pub mod query;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::CacheContext;

/// Semantic document cache - near-duplicate aware vector cache for retrieved chunks
#[derive(Parser)]
#[command(name = "semantic-doc-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the vector index if it does not exist
    InitIndex,

    /// Write documents from a JSON-lines file, skipping the near-duplicate check
    Seed(index::SeedArgs),

    /// Drop every cached document
    Reset,

    /// Embed a text file and admit its paragraphs
    Ingest(ingest::IngestArgs),

    /// Print the cached documents nearest to a text
    Query(query::QueryArgs),
}

/// Load configuration, initialise logging and wire the cache
pub(crate) async fn bootstrap() -> anyhow::Result<CacheContext> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    Ok(crate::create_cache_context(&config).await?)
}
