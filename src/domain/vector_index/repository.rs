//! Vector index trait and entry types

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::document::{ContentId, Document};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// A document staged for insertion, keyed by its content address
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    content_id: ContentId,
    document: Document,
}

impl IndexEntry {
    /// Create an entry with an explicit content id
    pub fn new(content_id: ContentId, document: Document) -> Self {
        Self {
            content_id,
            document,
        }
    }

    /// Stage a document for storage
    ///
    /// Derives the content id from the text and resets the similarity, since
    /// a stored document has not been compared against any query yet.
    pub fn from_document(mut document: Document) -> Self {
        document.clear_similarity();
        let content_id = ContentId::from_text(document.text());

        Self::new(content_id, document)
    }

    /// Get the content id
    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    /// Get the document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume and return the document
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// A stored document together with its content address and expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    content_id: ContentId,
    document: Document,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new cache entry
    pub fn new(content_id: ContentId, document: Document, expires_at: DateTime<Utc>) -> Self {
        Self {
            content_id,
            document,
            expires_at,
        }
    }

    /// Get the content id
    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    /// Get the document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Get the wall-clock expiry
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Consume and return the document
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Storage and approximate KNN search over cached documents
///
/// Every vector passed in must have exactly [`VectorIndex::dimension`]
/// components, otherwise the call fails with `DimensionMismatch`. A store
/// that cannot be reached, or that does not answer within the configured
/// timeout, fails with `IndexUnavailable`. Implementations never retry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Dimensionality every stored and queried vector must have
    fn dimension(&self) -> usize;

    /// Create the secondary index structures if they do not exist yet
    async fn ensure_index(&self) -> Result<(), DomainError>;

    /// Up to `k` live documents, most similar first
    ///
    /// Equal similarities are ordered by insertion recency, newest first.
    /// Each document carries `similarity = 1 - cosine distance`.
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<Document>, DomainError>;

    /// Store entries with an expiry of `now + ttl`, returning the number written
    ///
    /// Writing an existing content id replaces it and resets its TTL.
    async fn insert(&self, entries: Vec<IndexEntry>, ttl: Duration) -> Result<usize, DomainError>;

    /// Look up a live entry by content address
    async fn get(&self, content_id: &ContentId) -> Result<Option<CacheEntry>, DomainError>;

    /// Live documents whose locator equals `locator`
    async fn find_by_locator(&self, locator: &str) -> Result<Vec<Document>, DomainError>;

    /// Live documents whose text equals `text`
    async fn find_by_text(&self, text: &str) -> Result<Vec<Document>, DomainError>;

    /// Number of live entries
    async fn count(&self) -> Result<usize, DomainError>;

    /// Drop every entry. Reserved for test setup and resets.
    async fn remove_all(&self) -> Result<(), DomainError>;
}
