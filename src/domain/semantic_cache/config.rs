//! Semantic cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the semantic document cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Near-duplicate threshold (0.0 to 1.0)
    /// A candidate whose nearest cached neighbour scores at or above this
    /// value is dropped
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Time-to-live for cached entries in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Number of neighbours returned when a caller does not ask for a k
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// How many nearest-neighbour lookups an ingest may run at once
    /// (1 checks documents strictly one after another)
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
}

fn default_similarity_threshold() -> f32 {
    0.97
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_k() -> usize {
    10
}

fn default_lookup_concurrency() -> usize {
    1
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            ttl_secs: default_ttl_secs(),
            default_k: default_k(),
            lookup_concurrency: default_lookup_concurrency(),
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Set the near-duplicate threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// Set the default k
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Set the lookup concurrency (at least 1)
    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.lookup_concurrency = concurrency.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SemanticCacheConfig::default();

        assert!((config.similarity_threshold - 0.97).abs() < f32::EPSILON);
        assert_eq!(config.ttl(), Duration::from_secs(3600));
        assert_eq!(config.default_k, 10);
        assert_eq!(config.lookup_concurrency, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = SemanticCacheConfig::new()
            .with_similarity_threshold(0.9)
            .with_ttl(Duration::from_secs(1800))
            .with_default_k(5)
            .with_lookup_concurrency(4);

        assert!((config.similarity_threshold - 0.9).abs() < 0.01);
        assert_eq!(config.ttl(), Duration::from_secs(1800));
        assert_eq!(config.default_k, 5);
        assert_eq!(config.lookup_concurrency, 4);
    }

    #[test]
    fn test_similarity_threshold_clamped() {
        let config = SemanticCacheConfig::new().with_similarity_threshold(1.5);
        assert!((config.similarity_threshold - 1.0).abs() < 0.01);

        let config = SemanticCacheConfig::new().with_similarity_threshold(-0.5);
        assert!(config.similarity_threshold.abs() < 0.01);
    }

    #[test]
    fn test_lookup_concurrency_at_least_one() {
        let config = SemanticCacheConfig::new().with_lookup_concurrency(0);
        assert_eq!(config.lookup_concurrency, 1);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SemanticCacheConfig = serde_json::from_str(r#"{"ttl_secs": 60}"#).unwrap();

        assert_eq!(config.ttl_secs, 60);
        assert_eq!(config.default_k, 10);
    }
}
