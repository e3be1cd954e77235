//! Semantic document cache
//!
//! Answers nearest-neighbour queries over cached documents and admits new
//! documents through the near-duplicate filter.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use super::dedup_pipeline::{DedupPipeline, IngestSummary};
use crate::domain::document::Document;
use crate::domain::error::ensure_vector;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::domain::vector_index::VectorIndex;
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_index_error, record_query};

/// Facade over the vector index and the write pipeline
pub struct SemanticCacheService {
    index: Arc<dyn VectorIndex>,
    pipeline: DedupPipeline,
}

impl fmt::Debug for SemanticCacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticCacheService")
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl SemanticCacheService {
    /// Create a cache with default settings
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self::with_config(index, SemanticCacheConfig::default())
    }

    /// Create a cache with custom config
    pub fn with_config(index: Arc<dyn VectorIndex>, config: SemanticCacheConfig) -> Self {
        let pipeline = DedupPipeline::new(index.clone(), config);

        Self { index, pipeline }
    }

    /// Get the configuration
    pub fn config(&self) -> &SemanticCacheConfig {
        self.pipeline.config()
    }

    /// Dimensionality of every vector this cache accepts
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Number of neighbours used by callers without a preference
    pub fn default_k(&self) -> usize {
        self.config().default_k
    }

    /// Underlying index, for maintenance lookups
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Up to `k` cached documents most similar to `vector`
    ///
    /// An empty cache yields an empty result, not an error.
    pub async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Document>, DomainError> {
        ensure_vector(self.index.dimension(), vector)?;

        let started = Instant::now();
        let documents = self
            .index
            .search(vector, k)
            .await
            .inspect_err(|_| record_index_error("search"))?;

        record_query(documents.len(), started.elapsed());
        debug!(k, hits = documents.len(), "Semantic cache query");

        Ok(documents)
    }

    /// Admit documents, returning how many were written
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<usize, DomainError> {
        Ok(self.ingest_with_summary(documents).await?.inserted)
    }

    /// Admit documents, returning the full outcome
    pub async fn ingest_with_summary(
        &self,
        documents: Vec<Document>,
    ) -> Result<IngestSummary, DomainError> {
        self.pipeline.ingest(documents).await
    }

    /// Write documents directly, without the near-duplicate check
    pub async fn seed(&self, documents: Vec<Document>) -> Result<usize, DomainError> {
        self.pipeline.seed(documents).await
    }

    /// Drop every cached document
    pub async fn reset(&self) -> Result<(), DomainError> {
        self.index
            .remove_all()
            .await
            .inspect_err(|_| record_index_error("remove_all"))?;

        info!("Semantic cache reset");

        Ok(())
    }
}
