//! Index maintenance commands

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::domain::document::Document;

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// JSON-lines file, one `{"locator", "text", "vector"}` object per line
    #[arg(long)]
    pub file: PathBuf,
}

/// Create the vector index if it does not exist
pub async fn init_index() -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    context.cache.index().ensure_index().await?;
    info!("Vector index ready");

    Ok(())
}

/// Drop every cached document
pub async fn reset() -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    context.cache.reset().await?;

    Ok(())
}

/// Load documents from a JSON-lines file
pub async fn seed(args: SeedArgs) -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    let contents = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let documents = parse_seed_lines(&contents)?;

    context.cache.index().ensure_index().await?;
    let written = context.cache.seed(documents).await?;

    println!("{}", written);

    Ok(())
}

/// Parse JSON lines into documents, ignoring blank lines
fn parse_seed_lines(contents: &str) -> anyhow::Result<Vec<Document>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<Document>(line)
                .with_context(|| format!("Invalid document on line {}", number + 1))
        })
        .collect()
}
