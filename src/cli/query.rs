//! Query command - print the cached documents nearest to a text

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::domain::document::Document;
use crate::domain::embedding::EmbeddingProviderExt;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Text to embed and look up
    #[arg(long)]
    pub text: String,

    /// Number of neighbours (defaults to `cache.default_k`)
    #[arg(short, long)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
struct QueryHit<'a> {
    similarity: f32,
    locator: &'a str,
    text: &'a str,
}

impl<'a> From<&'a Document> for QueryHit<'a> {
    fn from(document: &'a Document) -> Self {
        Self {
            similarity: document.similarity(),
            locator: document.locator(),
            text: document.text(),
        }
    }
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    let vectors = context
        .embeddings
        .embed_chunks(std::slice::from_ref(&args.text))
        .await?;
    let vector = vectors
        .into_iter()
        .next()
        .context("Embedding provider returned no vector")?;

    let k = args.k.unwrap_or_else(|| context.cache.default_k());
    let documents = context.cache.query(&vector, k).await?;

    for document in &documents {
        println!("{}", serde_json::to_string(&QueryHit::from(document))?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_hit_omits_vector() {
        let document = Document::new("a.md", "hello", vec![1.0, 0.0]).with_similarity(0.5);

        let json = serde_json::to_value(QueryHit::from(&document)).unwrap();

        assert_eq!(json["locator"], "a.md");
        assert_eq!(json["similarity"], 0.5);
        assert!(json.get("vector").is_none());
    }
}
