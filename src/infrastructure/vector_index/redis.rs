//! Redis vector index implementation (RedisJSON + RediSearch)

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{Client, RedisResult, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::search_reply::{parse_search_reply, SearchHit};
use crate::domain::document::{ContentId, Document, SIMILARITY_UNSET};
use crate::domain::error::ensure_vector;
use crate::domain::vector_index::{CacheEntry, IndexEntry, VectorIndex};
use crate::domain::DomainError;

/// Upper bound on documents returned by locator lookups
const MAINTENANCE_LOOKUP_LIMIT: usize = 1000;

/// Separator of the locator TAG field; locators rarely contain it
const LOCATOR_TAG_SEPARATOR: char = '|';

/// Configuration for the Redis vector index
#[derive(Debug, Clone)]
pub struct RedisVectorIndexConfig {
    /// RediSearch index name
    pub index_name: String,
    /// Key prefix of cached documents (keys are `{prefix}:{content_id}`)
    pub key_prefix: String,
    /// Vector dimensionality
    pub dimension: usize,
    /// Per-operation timeout; an elapsed timeout is reported as unavailability
    pub operation_timeout: Duration,
}

impl Default for RedisVectorIndexConfig {
    fn default() -> Self {
        Self {
            index_name: "idx:chunks_vss".to_string(),
            key_prefix: "chunks".to_string(),
            dimension: 1536,
            operation_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisVectorIndexConfig {
    /// Creates a new configuration for the given dimensionality
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    /// Sets the index name
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the operation timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// JSON document stored under each cache key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    locator: String,
    text: String,
    vector: Vec<f32>,
    similarity: f32,
    inserted_at_ms: i64,
    /// Position within the insert batch; later entries rank as newer
    #[serde(default)]
    sequence: u64,
    expires_at_ms: i64,
}

/// Open the shared connection handle for a Redis Stack server
///
/// The returned manager is a multiplexed, reconnecting handle; clones share
/// one underlying connection and may be used concurrently.
pub async fn open_connection(url: &str, timeout: Duration) -> Result<ConnectionManager, DomainError> {
    let client = Client::open(url)
        .map_err(|e| DomainError::configuration(format!("Invalid Redis URL '{}': {}", url, e)))?;

    tokio::time::timeout(timeout, ConnectionManager::new(client))
        .await
        .map_err(|_| {
            DomainError::index_unavailable(format!("Timed out connecting to Redis after {:?}", timeout))
        })?
        .map_err(|e| DomainError::index_unavailable(format!("Failed to connect to Redis: {}", e)))
}

/// Vector index backed by Redis Stack
///
/// Documents are JSON values under `{prefix}:{content_id}` with a per-key
/// `EXPIRE`; expiry is enforced by the server. KNN search runs over a FLAT
/// FLOAT32 cosine vector field.
#[derive(Clone)]
pub struct RedisVectorIndex {
    connection: ConnectionManager,
    config: RedisVectorIndexConfig,
}

impl fmt::Debug for RedisVectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisVectorIndex")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisVectorIndex {
    /// Creates an index over an already opened connection
    pub fn new(connection: ConnectionManager, config: RedisVectorIndexConfig) -> Self {
        Self { connection, config }
    }

    fn key(&self, content_id: &ContentId) -> String {
        format!("{}:{}", self.config.key_prefix, content_id)
    }

    fn content_id_from_key(&self, key: &str) -> ContentId {
        let digest = key
            .strip_prefix(&self.config.key_prefix)
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(key);

        ContentId::from_digest(digest)
    }

    async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        tokio::time::timeout(self.config.operation_timeout, fut)
            .await
            .map_err(|_| {
                DomainError::index_unavailable(format!(
                    "{} timed out after {:?}",
                    operation, self.config.operation_timeout
                ))
            })?
            .map_err(|e| DomainError::index_unavailable(format!("{} failed: {}", operation, e)))
    }

    async fn scan_keys(&self) -> Result<Vec<String>, DomainError> {
        let pattern = format!("{}:*", self.config.key_prefix);
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut keys = Vec::new();

        loop {
            let (new_cursor, batch): (u64, Vec<String>) = self
                .run(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(1000)
                        .query_async(&mut conn),
                )
                .await?;

            keys.extend(batch);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }

    /// Documents stored under exactly `locator`, newest first
    ///
    /// The TAG query narrows candidates; equality is checked client-side
    /// because a locator containing the separator is indexed as several tags.
    async fn find_locator_matches(&self, locator: &str) -> Result<Vec<Document>, DomainError> {
        let mut conn = self.connection.clone();
        let reply: Value = self
            .run(
                "FT.SEARCH",
                redis::cmd("FT.SEARCH")
                    .arg(&self.config.index_name)
                    .arg(locator_tag_query(locator))
                    .arg("RETURN")
                    .arg(4)
                    .arg("text")
                    .arg("locator")
                    .arg("vector")
                    .arg("inserted_at_ms")
                    .arg("SORTBY")
                    .arg("inserted_at_ms")
                    .arg("DESC")
                    .arg("LIMIT")
                    .arg(0)
                    .arg(MAINTENANCE_LOOKUP_LIMIT)
                    .arg("DIALECT")
                    .arg(2)
                    .query_async(&mut conn),
            )
            .await?;

        let mut documents = Vec::new();

        for hit in parse_search_reply(&reply)? {
            let document = hit_to_document(&hit)?;

            if document.locator() == locator {
                documents.push(document);
            }
        }

        Ok(documents)
    }
}

/// Backslash-escapes everything but alphanumerics for a TAG query value
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() * 2);

    for c in value.chars() {
        if !c.is_alphanumeric() {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// TAG query selecting every document that may carry `locator`
///
/// RediSearch splits the stored value on the separator and trims each
/// tag, so the first non-empty trimmed segment is used; without one the
/// query falls back to every document.
fn locator_tag_query(locator: &str) -> String {
    match locator
        .split(LOCATOR_TAG_SEPARATOR)
        .map(str::trim)
        .find(|tag| !tag.is_empty())
    {
        Some(tag) => format!("@locator:{{{}}}", escape_tag(tag)),
        None => "*".to_string(),
    }
}

/// Little-endian FLOAT32 blob, as RediSearch expects for vector parameters
fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn parse_vector(raw: &str) -> Result<Vec<f32>, DomainError> {
    serde_json::from_str(raw)
        .map_err(|e| DomainError::serialization(format!("Failed to parse stored vector: {}", e)))
}

fn hit_to_document(hit: &SearchHit) -> Result<Document, DomainError> {
    let vector = parse_vector(hit.field("vector")?)?;

    Ok(Document::new(hit.field("locator")?, hit.field("text")?, vector))
}

/// Numeric recency field of a hit; absent or malformed values sort oldest
fn recency_field<T: std::str::FromStr + Default>(hit: &SearchHit, name: &str) -> T {
    hit.fields
        .get(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// KNN hit with its ordering keys
struct RankedHit {
    similarity: f32,
    inserted_at_ms: i64,
    sequence: u64,
    key: String,
    document: Document,
}

/// Turns KNN hits into documents ordered by similarity, then recency
///
/// Recency is the insert time, then the position within that insert's
/// batch; the key settles whatever remains so the order is total.
fn rank_hits(hits: Vec<SearchHit>, k: usize) -> Result<Vec<Document>, DomainError> {
    let mut ranked = Vec::with_capacity(hits.len());

    for hit in hits {
        let distance: f32 = hit.field("vector_score")?.parse().map_err(|e| {
            DomainError::serialization(format!("Invalid vector_score on '{}': {}", hit.key, e))
        })?;
        let similarity = 1.0 - distance;

        ranked.push(RankedHit {
            similarity,
            inserted_at_ms: recency_field(&hit, "inserted_at_ms"),
            sequence: recency_field(&hit, "sequence"),
            document: hit_to_document(&hit)?.with_similarity(similarity),
            key: hit.key,
        });
    }

    ranked.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| b.inserted_at_ms.cmp(&a.inserted_at_ms))
            .then_with(|| b.sequence.cmp(&a.sequence))
            .then_with(|| b.key.cmp(&a.key))
    });
    ranked.truncate(k);

    Ok(ranked.into_iter().map(|hit| hit.document).collect())
}

#[async_trait]
impl VectorIndex for RedisVectorIndex {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn ensure_index(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();
        let prefix = format!("{}:", self.config.key_prefix);

        let result: RedisResult<()> = redis::cmd("FT.CREATE")
            .arg(&self.config.index_name)
            .arg("ON")
            .arg("JSON")
            .arg("PREFIX")
            .arg(1)
            .arg(&prefix)
            .arg("SCHEMA")
            .arg("$.text")
            .arg("AS")
            .arg("text")
            .arg("TEXT")
            .arg("NOSTEM")
            .arg("$.locator")
            .arg("AS")
            .arg("locator")
            .arg("TAG")
            .arg("SEPARATOR")
            .arg(LOCATOR_TAG_SEPARATOR.to_string())
            .arg("CASESENSITIVE")
            .arg("$.inserted_at_ms")
            .arg("AS")
            .arg("inserted_at_ms")
            .arg("NUMERIC")
            .arg("SORTABLE")
            .arg("$.sequence")
            .arg("AS")
            .arg("sequence")
            .arg("NUMERIC")
            .arg("SORTABLE")
            .arg("$.vector")
            .arg("AS")
            .arg("vector")
            .arg("VECTOR")
            .arg("FLAT")
            .arg(6)
            .arg("TYPE")
            .arg("FLOAT32")
            .arg("DIM")
            .arg(self.config.dimension)
            .arg("DISTANCE_METRIC")
            .arg("COSINE")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                info!(
                    index = %self.config.index_name,
                    dimension = self.config.dimension,
                    "Created vector index"
                );
                Ok(())
            }
            Err(e) if e.to_string().contains("Index already exists") => {
                debug!(index = %self.config.index_name, "Vector index already exists");
                Ok(())
            }
            Err(e) => Err(DomainError::index_unavailable(format!(
                "Failed to create index '{}': {}",
                self.config.index_name, e
            ))),
        }
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<Document>, DomainError> {
        ensure_vector(self.config.dimension, vector)?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let query = format!("(*)=>[KNN {} @vector $query_vector AS vector_score]", k);
        let mut conn = self.connection.clone();

        let reply: Value = self
            .run(
                "FT.SEARCH",
                redis::cmd("FT.SEARCH")
                    .arg(&self.config.index_name)
                    .arg(&query)
                    .arg("PARAMS")
                    .arg(2)
                    .arg("query_vector")
                    .arg(vector_to_bytes(vector))
                    .arg("SORTBY")
                    .arg("vector_score")
                    .arg("ASC")
                    .arg("RETURN")
                    .arg(6)
                    .arg("vector_score")
                    .arg("text")
                    .arg("locator")
                    .arg("vector")
                    .arg("inserted_at_ms")
                    .arg("sequence")
                    .arg("LIMIT")
                    .arg(0)
                    .arg(k)
                    .arg("DIALECT")
                    .arg(2)
                    .query_async(&mut conn),
            )
            .await?;

        rank_hits(parse_search_reply(&reply)?, k)
    }

    async fn insert(&self, entries: Vec<IndexEntry>, ttl: Duration) -> Result<usize, DomainError> {
        for entry in &entries {
            ensure_vector(self.config.dimension, entry.document().vector())?;
        }

        if entries.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().timestamp_millis();
        let ttl_secs = ttl.as_secs().max(1);
        let expires_at_ms = now.saturating_add((ttl_secs as i64).saturating_mul(1000));
        let mut pipe = redis::pipe();
        pipe.atomic();

        for (sequence, entry) in (0u64..).zip(&entries) {
            let document = entry.document();
            let stored = StoredDocument {
                locator: document.locator().to_string(),
                text: document.text().to_string(),
                vector: document.vector().to_vec(),
                similarity: SIMILARITY_UNSET,
                inserted_at_ms: now,
                sequence,
                expires_at_ms,
            };
            let payload = serde_json::to_string(&stored).map_err(|e| {
                DomainError::serialization(format!("Failed to serialize document: {}", e))
            })?;
            let key = self.key(entry.content_id());

            pipe.cmd("JSON.SET")
                .arg(&key)
                .arg("$")
                .arg(payload)
                .ignore()
                .cmd("EXPIRE")
                .arg(&key)
                .arg(ttl_secs)
                .ignore();
        }

        let mut conn = self.connection.clone();
        let _: () = self
            .run("pipelined insert", pipe.query_async(&mut conn))
            .await?;

        Ok(entries.len())
    }

    async fn get(&self, content_id: &ContentId) -> Result<Option<CacheEntry>, DomainError> {
        let key = self.key(content_id);
        let mut conn = self.connection.clone();

        let raw: Option<String> = self
            .run(
                "JSON.GET",
                redis::cmd("JSON.GET").arg(&key).arg("$").query_async(&mut conn),
            )
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let stored: Vec<StoredDocument> = serde_json::from_str(&raw).map_err(|e| {
            DomainError::serialization(format!("Failed to parse document '{}': {}", key, e))
        })?;

        Ok(stored.into_iter().next().map(|doc| {
            let expires_at = DateTime::<Utc>::from_timestamp_millis(doc.expires_at_ms)
                .unwrap_or_else(Utc::now);
            let id = self.content_id_from_key(&key);

            CacheEntry::new(
                id,
                Document::new(doc.locator, doc.text, doc.vector),
                expires_at,
            )
        }))
    }

    async fn find_by_locator(&self, locator: &str) -> Result<Vec<Document>, DomainError> {
        self.find_locator_matches(locator).await
    }

    /// Text is content-addressed, so an exact match is a key lookup
    async fn find_by_text(&self, text: &str) -> Result<Vec<Document>, DomainError> {
        let entry = self.get(&ContentId::from_text(text)).await?;

        Ok(entry
            .map(|entry| entry.into_document())
            .filter(|document| document.text() == text)
            .into_iter()
            .collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.scan_keys().await?.len())
    }

    async fn remove_all(&self) -> Result<(), DomainError> {
        let keys = self.scan_keys().await?;
        let mut conn = self.connection.clone();

        for batch in keys.chunks(500) {
            let _: usize = self
                .run("DEL", redis::cmd("DEL").arg(batch).query_async(&mut conn))
                .await?;
        }

        info!(removed = keys.len(), "Removed all cached documents");

        Ok(())
    }
}
