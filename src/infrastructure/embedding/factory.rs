//! Embedding provider factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;

use super::encoder_service::{EncoderServiceEmbeddingProvider, DEFAULT_ENCODER_BASE_URL};
use super::http_client::HttpClient;
use super::openai::{OpenAiEmbeddingProvider, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// OpenAI embeddings API
    #[default]
    Openai,
    /// Self-hosted encoder sidecar
    Encoder,
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingBackend::Openai => write!(f, "openai"),
            EmbeddingBackend::Encoder => write!(f, "encoder"),
        }
    }
}

impl std::str::FromStr for EmbeddingBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingBackend::Openai),
            "encoder" | "remote" => Ok(EmbeddingBackend::Encoder),
            _ => Err(DomainError::configuration(format!(
                "Unknown embedding backend: {}. Valid backends: openai, encoder",
                s
            ))),
        }
    }
}

/// Configuration for the embedding provider (`embedding` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Base URL; defaults depend on the backend
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key (OpenAI only)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (OpenAI only)
    #[serde(default)]
    pub model: Option<String>,

    /// Vector dimensionality; defaults depend on the backend and model
    #[serde(default)]
    pub dimensions: Option<usize>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            base_url: None,
            api_key: None,
            model: None,
            dimensions: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl EmbeddingConfig {
    /// Creates a configuration for the OpenAI API
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            backend: EmbeddingBackend::Openai,
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Creates a configuration for the encoder sidecar
    pub fn encoder(base_url: impl Into<String>) -> Self {
        Self {
            backend: EmbeddingBackend::Encoder,
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Sets the dimensionality
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Sets the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Get the request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Factory for creating embedding providers
#[derive(Debug, Default)]
pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates an embedding provider based on configuration
    pub fn create(
        &self,
        config: &EmbeddingConfig,
    ) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        let client = HttpClient::with_timeout(config.timeout())?;

        match config.backend {
            EmbeddingBackend::Openai => {
                let api_key = config.api_key.as_deref().ok_or_else(|| {
                    DomainError::configuration("embedding.api_key is required for the openai backend")
                })?;
                let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_BASE_URL);
                let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);

                let provider = OpenAiEmbeddingProvider::with_base_url(client, api_key, base_url)
                    .with_model(model, config.dimensions)?;

                Ok(Arc::new(provider))
            }
            EmbeddingBackend::Encoder => {
                let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_ENCODER_BASE_URL);
                let mut provider = EncoderServiceEmbeddingProvider::with_base_url(client, base_url);

                if let Some(dimensions) = config.dimensions {
                    provider = provider.with_dimensions(dimensions);
                }

                Ok(Arc::new(provider))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(
            "openai".parse::<EmbeddingBackend>().unwrap(),
            EmbeddingBackend::Openai
        );
        assert_eq!(
            "Encoder".parse::<EmbeddingBackend>().unwrap(),
            EmbeddingBackend::Encoder
        );
        assert!("bedrock".parse::<EmbeddingBackend>().is_err());
        assert_eq!(EmbeddingBackend::Encoder.to_string(), "encoder");
    }

    #[test]
    fn test_create_openai_defaults() {
        let provider = EmbeddingProviderFactory::new()
            .create(&EmbeddingConfig::openai("sk-test"))
            .unwrap();

        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.dimensions(), 1536);
    }

    #[test]
    fn test_create_openai_requires_key() {
        let result = EmbeddingProviderFactory::new().create(&EmbeddingConfig::default());

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_create_openai_known_model() {
        let config = EmbeddingConfig::openai("sk-test").with_model("text-embedding-3-large");
        let provider = EmbeddingProviderFactory::new().create(&config).unwrap();

        assert_eq!(provider.dimensions(), 3072);
    }

    #[test]
    fn test_create_encoder() {
        let provider = EmbeddingProviderFactory::new()
            .create(&EmbeddingConfig::encoder("http://localhost:9000"))
            .unwrap();

        assert_eq!(provider.provider_name(), "encoder");
        assert_eq!(provider.dimensions(), 384);

        let provider = EmbeddingProviderFactory::new()
            .create(&EmbeddingConfig::encoder("http://localhost:9000").with_dimensions(768))
            .unwrap();
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_config_deserialize() {
        let config: EmbeddingConfig =
            serde_json::from_str(r#"{"backend": "encoder", "dimensions": 384}"#).unwrap();

        assert_eq!(config.backend, EmbeddingBackend::Encoder);
        assert_eq!(config.dimensions, Some(384));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
