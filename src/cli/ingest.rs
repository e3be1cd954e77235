//! Ingest command - embed a text file and admit its paragraphs

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::domain::embedding::EmbeddingProviderExt;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Source identifier stored with every chunk
    #[arg(long)]
    pub locator: String,

    /// Text file; paragraphs separated by blank lines become chunks
    #[arg(long)]
    pub file: PathBuf,
}

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    let contents = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let chunks = split_paragraphs(&contents);

    let documents = context
        .embeddings
        .embed_documents(&args.locator, chunks)
        .await?;
    let summary = context.cache.ingest_with_summary(documents).await?;

    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}

/// Blank-line separated paragraphs, trimmed, empty ones dropped
fn split_paragraphs(contents: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}
