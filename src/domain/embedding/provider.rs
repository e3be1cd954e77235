//! Embedding provider trait definition

use std::fmt::Debug;
use std::future::Future;

use async_trait::async_trait;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::document::Document;
use crate::domain::error::ensure_vector;
use crate::domain::DomainError;

/// Trait for embedding providers (OpenAI, self-hosted encoder, ...)
///
/// A provider instance is bound to one vector dimensionality for its whole
/// lifetime; it must match the dimensionality of the vector index it feeds.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for the given chunks
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the dimensionality of the vectors this provider produces
    fn dimensions(&self) -> usize;
}

/// Extension trait with the call contract the cache relies on
pub trait EmbeddingProviderExt: EmbeddingProvider {
    /// Embed chunks, returning one vector per chunk in input order
    ///
    /// Transport and protocol failures surface as `EmbeddingUnavailable`;
    /// this never substitutes placeholder vectors.
    fn embed_chunks<'a>(
        &'a self,
        chunks: &'a [String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, DomainError>> + Send + 'a {
        async move {
            if chunks.is_empty() {
                return Ok(Vec::new());
            }

            let response = self.embed(EmbeddingRequest::new(chunks.to_vec())).await?;
            let vectors = response.into_ordered_vectors(self.provider_name(), chunks.len())?;

            for vector in &vectors {
                ensure_vector(self.dimensions(), vector)?;
            }

            Ok(vectors)
        }
    }

    /// Embed chunks that share a source locator and wrap them as documents
    fn embed_documents<'a>(
        &'a self,
        locator: &'a str,
        chunks: Vec<String>,
    ) -> impl Future<Output = Result<Vec<Document>, DomainError>> + Send + 'a {
        async move {
            let vectors = self.embed_chunks(&chunks).await?;

            Ok(chunks
                .into_iter()
                .zip(vectors)
                .map(|(text, vector)| Document::new(locator, text, vector))
                .collect())
        }
    }
}

// Blanket implementation for all embedding providers
impl<T: EmbeddingProvider + ?Sized> EmbeddingProviderExt for T {}
