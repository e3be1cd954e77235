//! Vector index factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::vector_index::VectorIndex;
use crate::domain::DomainError;

use super::in_memory::InMemoryVectorIndex;
use super::redis::{open_connection, RedisVectorIndex, RedisVectorIndexConfig};

/// Supported vector index backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorIndexBackend {
    /// Process-local index, lost on restart
    #[default]
    InMemory,
    /// Redis Stack (RedisJSON + RediSearch)
    Redis,
}

impl std::fmt::Display for VectorIndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorIndexBackend::InMemory => write!(f, "in_memory"),
            VectorIndexBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for VectorIndexBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(VectorIndexBackend::InMemory),
            "redis" => Ok(VectorIndexBackend::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown index backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the vector index (`index` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(default)]
    pub backend: VectorIndexBackend,

    /// Redis URL (required for the Redis backend)
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Vector dimensionality; must match the embedding provider
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_index_name() -> String {
    "idx:chunks_vss".to_string()
}

fn default_key_prefix() -> String {
    "chunks".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            backend: VectorIndexBackend::default(),
            redis_url: None,
            index_name: default_index_name(),
            key_prefix: default_key_prefix(),
            dimension: default_dimension(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl VectorIndexConfig {
    /// Creates a configuration for an in-memory index
    pub fn in_memory(dimension: usize) -> Self {
        Self {
            backend: VectorIndexBackend::InMemory,
            dimension,
            ..Default::default()
        }
    }

    /// Creates a configuration for a Redis index
    pub fn redis(url: impl Into<String>, dimension: usize) -> Self {
        Self {
            backend: VectorIndexBackend::Redis,
            redis_url: Some(url.into()),
            dimension,
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the index name
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    /// Get the operation timeout as Duration
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Factory for creating vector index instances
#[derive(Debug, Default)]
pub struct VectorIndexFactory;

impl VectorIndexFactory {
    /// Creates a new vector index factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a vector index based on configuration
    pub async fn create(
        &self,
        config: &VectorIndexConfig,
    ) -> Result<Arc<dyn VectorIndex>, DomainError> {
        if config.dimension == 0 {
            return Err(DomainError::configuration(
                "Index dimension must be greater than zero",
            ));
        }

        match config.backend {
            VectorIndexBackend::InMemory => Ok(Arc::new(InMemoryVectorIndex::new(config.dimension))),
            VectorIndexBackend::Redis => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the redis index backend")
                })?;

                let connection = open_connection(url, config.operation_timeout()).await?;
                let redis_config = RedisVectorIndexConfig::new(config.dimension)
                    .with_index_name(config.index_name.clone())
                    .with_key_prefix(config.key_prefix.clone())
                    .with_operation_timeout(config.operation_timeout());

                Ok(Arc::new(RedisVectorIndex::new(connection, redis_config)))
            }
        }
    }
}
