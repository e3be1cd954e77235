//! In-memory vector index implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::document::{ContentId, Document};
use crate::domain::embedding::cosine_similarity;
use crate::domain::error::ensure_vector;
use crate::domain::vector_index::{CacheEntry, IndexEntry, VectorIndex};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
struct StoredEntry {
    document: Document,
    /// Visibility deadline on the runtime clock
    deadline: Instant,
    /// Wall-clock expiry reported to callers
    expires_at: DateTime<Utc>,
    /// Insertion sequence, used to break similarity ties
    sequence: u64,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}

/// In-memory vector index using brute-force cosine search
///
/// Expiry is passive: entries past their deadline are invisible to every
/// read, and are physically dropped on the next write or by
/// [`InMemoryVectorIndex::purge_expired`].
/// Suitable for development, tests and single-process deployments.
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    entries: RwLock<HashMap<ContentId, StoredEntry>>,
    dimension: usize,
    sequence: AtomicU64,
}

impl InMemoryVectorIndex {
    /// Create a new in-memory index for vectors of the given dimensionality
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dimension,
            sequence: AtomicU64::new(0),
        }
    }

    /// Physically drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize, DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::index_unavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(Self::purge_locked(&mut entries, Instant::now()))
    }

    fn purge_locked(entries: &mut HashMap<ContentId, StoredEntry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Live documents matching a predicate, newest first
    fn find_where<F>(&self, predicate: F) -> Result<Vec<Document>, DomainError>
    where
        F: Fn(&Document) -> bool,
    {
        let entries = self.entries.read().map_err(|e| {
            DomainError::index_unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        let now = Instant::now();

        let mut matches: Vec<&StoredEntry> = entries
            .values()
            .filter(|entry| entry.is_live(now))
            .filter(|entry| predicate(&entry.document))
            .collect();

        matches.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        Ok(matches.into_iter().map(|e| e.document.clone()).collect())
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn ensure_index(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<Document>, DomainError> {
        ensure_vector(self.dimension, vector)?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().map_err(|e| {
            DomainError::index_unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        let now = Instant::now();

        let mut scored: Vec<(f32, &StoredEntry)> = entries
            .values()
            .filter(|entry| entry.is_live(now))
            .map(|entry| (cosine_similarity(vector, entry.document.vector()), entry))
            .collect();

        // Similarity descending, then most recent insertion first
        scored.sort_by(|(sim_a, a), (sim_b, b)| {
            sim_b
                .total_cmp(sim_a)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });

        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(similarity, entry)| entry.document.clone().with_similarity(similarity))
            .collect())
    }

    async fn insert(&self, entries: Vec<IndexEntry>, ttl: Duration) -> Result<usize, DomainError> {
        for entry in &entries {
            ensure_vector(self.dimension, entry.document().vector())?;
        }

        if entries.is_empty() {
            return Ok(0);
        }

        let ttl_delta = chrono::Duration::from_std(ttl)
            .map_err(|e| DomainError::validation(format!("TTL out of range: {}", e)))?;
        let now = Instant::now();
        let deadline = now
            .checked_add(ttl)
            .ok_or_else(|| DomainError::validation("TTL out of range"))?;
        let expires_at = Utc::now() + ttl_delta;

        let mut stored = self.entries.write().map_err(|e| {
            DomainError::index_unavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        let purged = Self::purge_locked(&mut stored, now);

        if purged > 0 {
            debug!(purged, "Dropped expired entries from in-memory index");
        }

        let count = entries.len();

        for entry in entries {
            let content_id = entry.content_id().clone();
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

            stored.insert(
                content_id,
                StoredEntry {
                    document: entry.into_document(),
                    deadline,
                    expires_at,
                    sequence,
                },
            );
        }

        Ok(count)
    }

    async fn get(&self, content_id: &ContentId) -> Result<Option<CacheEntry>, DomainError> {
        let entries = self.entries.read().map_err(|e| {
            DomainError::index_unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        let now = Instant::now();

        Ok(entries
            .get(content_id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| {
                CacheEntry::new(content_id.clone(), entry.document.clone(), entry.expires_at)
            }))
    }

    async fn find_by_locator(&self, locator: &str) -> Result<Vec<Document>, DomainError> {
        self.find_where(|doc| doc.locator() == locator)
    }

    async fn find_by_text(&self, text: &str) -> Result<Vec<Document>, DomainError> {
        self.find_where(|doc| doc.text() == text)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let entries = self.entries.read().map_err(|e| {
            DomainError::index_unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        let now = Instant::now();

        Ok(entries.values().filter(|entry| entry.is_live(now)).count())
    }

    async fn remove_all(&self) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::index_unavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        entries.clear();

        Ok(())
    }
}
