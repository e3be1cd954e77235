//! OpenAI embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::attribute_to;
use super::HttpClientTrait;
use crate::domain::embedding::{Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-ada-002";

/// Known OpenAI embedding models, their native dimensions and whether they
/// accept a shorter `dimensions` request parameter
const EMBEDDING_MODELS: &[(&str, usize, bool)] = &[
    ("text-embedding-3-small", 1536, true),
    ("text-embedding-3-large", 3072, true),
    ("text-embedding-ada-002", 1536, false),
];

/// Dimensionality of a known OpenAI embedding model
pub fn model_dimensions(model: &str) -> Option<usize> {
    EMBEDDING_MODELS
        .iter()
        .find(|(name, _, _)| *name == model)
        .map(|(_, dims, _)| *dims)
}

fn supports_shortening(model: &str) -> bool {
    EMBEDDING_MODELS
        .iter()
        .any(|(name, _, shortenable)| *name == model && *shortenable)
}

/// Value of the `dimensions` request parameter for `model`, if one is needed
///
/// Unknown models are assumed to return the configured size natively.
fn requested_dimensions(model: &str, dimensions: usize) -> Result<Option<usize>, DomainError> {
    let Some(native) = model_dimensions(model) else {
        return Ok(None);
    };

    if dimensions == native {
        return Ok(None);
    }

    if dimensions == 0 || dimensions > native || !supports_shortening(model) {
        return Err(DomainError::configuration(format!(
            "OpenAI model '{}' cannot return {} dimensions (native {})",
            model, dimensions, native
        )));
    }

    Ok(Some(dimensions))
}

/// OpenAI embedding provider
#[derive(Debug)]
pub struct OpenAiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// Sent as `dimensions` when the configured size differs from the native one
    requested_dimensions: Option<usize>,
}

impl<C: HttpClientTrait> OpenAiEmbeddingProvider<C> {
    /// Create a provider for the default model
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    /// Create a new provider with custom base URL
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            dimensions: 1536,
            requested_dimensions: None,
        }
    }

    /// Use another model; unknown models need an explicit dimensionality
    pub fn with_model(
        mut self,
        model: impl Into<String>,
        dimensions: Option<usize>,
    ) -> Result<Self, DomainError> {
        let model = model.into();
        let dimensions = dimensions.or_else(|| model_dimensions(&model)).ok_or_else(|| {
            DomainError::configuration(format!(
                "Unknown dimensionality for OpenAI model '{}'; set embedding.dimensions",
                model
            ))
        })?;

        self.requested_dimensions = requested_dimensions(&model, dimensions)?;
        self.model = model;
        self.dimensions = dimensions;
        Ok(self)
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &EmbeddingRequest) -> serde_json::Value {
        let model = request.model().unwrap_or(self.model.as_str());
        let mut body = serde_json::json!({
            "model": model,
            "input": request.inputs(),
        });

        if let Some(dimensions) = self.requested_dimensions.filter(|_| model == self.model) {
            body["dimensions"] = serde_json::json!(dimensions);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<EmbeddingResponse, DomainError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding_unavailable(
                "openai",
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        let embeddings = response
            .data
            .into_iter()
            .map(|d| Embedding::new(d.index, d.embedding))
            .collect();

        Ok(EmbeddingResponse::new(response.model, embeddings))
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OpenAiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let url = self.embeddings_url();
        let body = self.build_request(&request);

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| attribute_to("openai", e))?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// OpenAI API types for embeddings

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    #[serde(default)]
    model: Option<String>,
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::EmbeddingProviderExt;
    use crate::infrastructure::embedding::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn create_mock_response(indices: &[usize], dimensions: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = indices
            .iter()
            .map(|&i| {
                let embedding: Vec<f32> = (0..dimensions).map(|j| (i * 10 + j) as f32).collect();
                serde_json::json!({
                    "index": i,
                    "embedding": embedding,
                    "object": "embedding"
                })
            })
            .collect();

        serde_json::json!({
            "model": "text-embedding-ada-002",
            "data": data,
            "usage": {"prompt_tokens": 10, "total_tokens": 10}
        })
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[0, 1], 4));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key")
            .with_model("text-embedding-3-small", Some(4))
            .unwrap();

        let response = provider
            .embed(EmbeddingRequest::new(vec!["a".into(), "b".into()]))
            .await
            .unwrap();

        assert_eq!(response.model(), Some("text-embedding-ada-002"));
        assert_eq!(response.len(), 2);
    }

    #[tokio::test]
    async fn test_request_body_uses_model_and_inputs() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[0], 1536));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        provider.embed(EmbeddingRequest::single("hello")).await.unwrap();

        let requests = provider.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1["model"], "text-embedding-ada-002");
        assert_eq!(requests[0].1["input"], serde_json::json!(["hello"]));
        assert!(requests[0].1.get("dimensions").is_none());
    }

    #[tokio::test]
    async fn test_request_body_carries_shortened_dimensions() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[0], 384));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key")
            .with_model("text-embedding-3-small", Some(384))
            .unwrap();

        let vectors = provider.embed_chunks(&["hello".to_string()]).await.unwrap();
        assert_eq!(vectors[0].len(), 384);

        let requests = provider.client.requests();
        assert_eq!(requests[0].1["model"], "text-embedding-3-small");
        assert_eq!(requests[0].1["dimensions"], 384);
    }

    #[test]
    fn test_requested_dimensions() {
        assert_eq!(requested_dimensions("text-embedding-3-small", 1536).unwrap(), None);
        assert_eq!(requested_dimensions("text-embedding-3-large", 256).unwrap(), Some(256));
        assert_eq!(requested_dimensions("custom", 2).unwrap(), None);

        for (model, dims) in [
            ("text-embedding-ada-002", 384),
            ("text-embedding-3-small", 4096),
            ("text-embedding-3-small", 0),
        ] {
            let err = requested_dimensions(model, dims).unwrap_err();
            assert!(matches!(err, DomainError::Configuration { .. }));
        }
    }

    #[tokio::test]
    async fn test_embed_chunks_restores_order() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[2, 0, 1], 2));
        let provider = OpenAiEmbeddingProvider::new(client, "key")
            .with_model("custom", Some(2))
            .unwrap();

        let chunks = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = provider.embed_chunks(&chunks).await.unwrap();

        assert_eq!(vectors[0], vec![0.0, 1.0]);
        assert_eq!(vectors[1], vec![10.0, 11.0]);
        assert_eq!(vectors[2], vec![20.0, 21.0]);
    }

    #[tokio::test]
    async fn test_embed_error_is_attributed() {
        let client = MockHttpClient::new().with_error(TEST_URL, "Rate limit exceeded");
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let err = provider.embed(EmbeddingRequest::single("Hello")).await.unwrap_err();

        match err {
            DomainError::EmbeddingUnavailable { provider, message } => {
                assert_eq!(provider, "openai");
                assert!(message.contains("Rate limit"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let client = MockHttpClient::new().with_response(TEST_URL, serde_json::json!({"foo": 1}));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let err = provider.embed(EmbeddingRequest::single("Hello")).await.unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let custom_url = "http://localhost:8080/v1/embeddings";
        let client = MockHttpClient::new().with_response(custom_url, create_mock_response(&[0], 1536));
        let provider =
            OpenAiEmbeddingProvider::with_base_url(client, "test-key", "http://localhost:8080/");

        let response = provider.embed(EmbeddingRequest::single("Hello")).await.unwrap();
        assert_eq!(response.len(), 1);
    }

    #[test]
    fn test_model_dimensions() {
        assert_eq!(model_dimensions("text-embedding-ada-002"), Some(1536));
        assert_eq!(model_dimensions("text-embedding-3-large"), Some(3072));
        assert_eq!(model_dimensions("unknown"), None);

        let client = MockHttpClient::new();
        let result = OpenAiEmbeddingProvider::new(client, "key").with_model("unknown", None);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_provider_info() {
        let provider = OpenAiEmbeddingProvider::new(MockHttpClient::new(), "key");

        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.dimensions(), 1536);
    }
}
