//! Near-duplicate filtering and batched writes
//!
//! Each candidate is compared against committed state only: one `k = 1`
//! lookup per document, then a single batched insert of everything that
//! survived. Candidates in the same batch are never compared with each other,
//! so two near-identical new documents may both be written.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::document::{ContentId, Document};
use crate::domain::error::ensure_vector;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::domain::vector_index::{IndexEntry, VectorIndex};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_index_error, record_ingest, IngestMetricParams};

/// Outcome of one ingest batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Documents handed to the pipeline
    pub submitted: usize,
    /// Distinct content ids written
    pub inserted: usize,
    /// Documents not written (near-duplicates and same-batch repeats)
    pub duplicates: usize,
}

/// Write path of the semantic cache
pub struct DedupPipeline {
    index: Arc<dyn VectorIndex>,
    config: SemanticCacheConfig,
}

impl fmt::Debug for DedupPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupPipeline")
            .field("dimension", &self.index.dimension())
            .field("config", &self.config)
            .finish()
    }
}

impl DedupPipeline {
    pub fn new(index: Arc<dyn VectorIndex>, config: SemanticCacheConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Filter near-duplicates and commit the rest in one batch
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<IngestSummary, DomainError> {
        let started = Instant::now();
        let submitted = documents.len();

        if documents.is_empty() {
            return Ok(IngestSummary::default());
        }

        self.validate(&documents)?;
        let staged = stage(documents);

        let survivors: Vec<Option<IndexEntry>> = stream::iter(staged)
            .map(|entry| self.check(entry))
            .buffered(self.config.lookup_concurrency.max(1))
            .try_collect()
            .await?;

        let insertables: Vec<IndexEntry> = survivors.into_iter().flatten().collect();
        let inserted = self.commit(insertables).await?;

        let summary = IngestSummary {
            submitted,
            inserted,
            duplicates: submitted.saturating_sub(inserted),
        };

        record_ingest(IngestMetricParams {
            source: "ingest",
            submitted,
            inserted,
            duplicates: summary.duplicates,
            duration: started.elapsed(),
        });
        info!(
            submitted = summary.submitted,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            "Ingested document batch"
        );

        Ok(summary)
    }

    /// Write documents without the near-duplicate check
    pub async fn seed(&self, documents: Vec<Document>) -> Result<usize, DomainError> {
        let started = Instant::now();
        let submitted = documents.len();

        self.validate(&documents)?;
        let inserted = self.commit(stage(documents)).await?;

        record_ingest(IngestMetricParams {
            source: "seed",
            submitted,
            inserted,
            duplicates: submitted.saturating_sub(inserted),
            duration: started.elapsed(),
        });
        info!(submitted, inserted, "Seeded documents");

        Ok(inserted)
    }

    fn validate(&self, documents: &[Document]) -> Result<(), DomainError> {
        let dimension = self.index.dimension();

        documents
            .iter()
            .try_for_each(|document| ensure_vector(dimension, document.vector()))
    }

    /// Keep the entry unless its nearest committed neighbour is at or above
    /// the threshold
    async fn check(&self, entry: IndexEntry) -> Result<Option<IndexEntry>, DomainError> {
        let nearest = self
            .index
            .search(entry.document().vector(), 1)
            .await
            .inspect_err(|_| record_index_error("search"))?;

        match nearest.first() {
            Some(neighbour) if neighbour.similarity() >= self.config.similarity_threshold => {
                debug!(
                    content_id = %entry.content_id(),
                    similarity = neighbour.similarity(),
                    "Dropping near-duplicate document"
                );
                Ok(None)
            }
            _ => Ok(Some(entry)),
        }
    }

    async fn commit(&self, entries: Vec<IndexEntry>) -> Result<usize, DomainError> {
        if entries.is_empty() {
            return Ok(0);
        }

        self.index
            .insert(entries, self.config.ttl())
            .await
            .inspect_err(|_| record_index_error("insert"))
    }
}

/// Content-address every document; repeated text keeps its first position
/// and the last occurrence's document
fn stage(documents: Vec<Document>) -> Vec<IndexEntry> {
    let mut positions: HashMap<ContentId, usize> = HashMap::with_capacity(documents.len());
    let mut staged: Vec<IndexEntry> = Vec::with_capacity(documents.len());

    for document in documents {
        let entry = IndexEntry::from_document(document);

        match positions.get(entry.content_id()) {
            Some(&position) => staged[position] = entry,
            None => {
                positions.insert(entry.content_id().clone(), staged.len());
                staged.push(entry);
            }
        }
    }

    staged
}
