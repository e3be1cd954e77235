//! Semantic document cache
//!
//! Caches retrieved document chunks together with their embedding vectors,
//! answers nearest-neighbour queries over them and refuses to store chunks
//! that are near-duplicates of something already cached.
//! - Vector index backends: in-memory and Redis Stack (RedisJSON + RediSearch)
//! - Embedding providers: OpenAI and a self-hosted encoder sidecar

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::fmt;
use std::sync::Arc;

use domain::embedding::EmbeddingProvider;
use domain::DomainError;
use infrastructure::embedding::EmbeddingProviderFactory;
use infrastructure::services::SemanticCacheService;
use infrastructure::vector_index::VectorIndexFactory;
use tracing::info;

/// Components wired from configuration
pub struct CacheContext {
    pub cache: Arc<SemanticCacheService>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
}

impl fmt::Debug for CacheContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheContext")
            .field("cache", &self.cache)
            .field("embeddings", &self.embeddings)
            .finish()
    }
}

/// Build the cache and its embedding provider
///
/// Fails with a configuration error when the provider and the index disagree
/// on vector dimensionality; this is checked before any connection is opened.
pub async fn create_cache_context(config: &AppConfig) -> Result<CacheContext, DomainError> {
    let embeddings = EmbeddingProviderFactory::new().create(&config.embedding)?;
    ensure_compatible(embeddings.as_ref(), config.index.dimension)?;

    let index = VectorIndexFactory::new().create(&config.index).await?;
    let cache = SemanticCacheService::with_config(index, config.cache.clone());

    info!(
        index_backend = %config.index.backend,
        embedding_backend = %config.embedding.backend,
        dimension = config.index.dimension,
        "Semantic cache initialized"
    );

    Ok(CacheContext {
        cache: Arc::new(cache),
        embeddings,
    })
}

fn ensure_compatible(
    embeddings: &dyn EmbeddingProvider,
    index_dimension: usize,
) -> Result<(), DomainError> {
    if embeddings.dimensions() != index_dimension {
        return Err(DomainError::configuration(format!(
            "Embedding provider '{}' produces {}-dimensional vectors but the index expects {}",
            embeddings.provider_name(),
            embeddings.dimensions(),
            index_dimension
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure::embedding::EmbeddingConfig;
    use infrastructure::vector_index::VectorIndexConfig;

    #[tokio::test]
    async fn test_create_context_in_memory() {
        let config = AppConfig {
            index: VectorIndexConfig::in_memory(384),
            embedding: EmbeddingConfig::encoder("http://localhost:9000"),
            ..Default::default()
        };

        let context = create_cache_context(&config).await.unwrap();

        assert_eq!(context.cache.dimension(), 384);
        assert_eq!(context.embeddings.provider_name(), "encoder");
    }

    #[tokio::test]
    async fn test_dimension_disagreement_is_configuration_error() {
        let config = AppConfig {
            index: VectorIndexConfig::in_memory(1536),
            embedding: EmbeddingConfig::encoder("http://localhost:9000"),
            ..Default::default()
        };

        let err = create_cache_context(&config).await.unwrap_err();

        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("384"));
    }
}
