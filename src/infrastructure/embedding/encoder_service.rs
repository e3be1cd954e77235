//! Self-hosted sentence encoder sidecar
//!
//! The sidecar exposes `POST {base}/encode` taking `{"text": [...]}` and
//! answering `{"embedding": [[...], ...]}` in input order.

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::attribute_to;
use super::HttpClientTrait;
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

pub const DEFAULT_ENCODER_BASE_URL: &str = "http://embeddings";
pub const DEFAULT_ENCODER_DIMENSIONS: usize = 384;

/// Embedding provider backed by the encoder sidecar
#[derive(Debug)]
pub struct EncoderServiceEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    dimensions: usize,
}

impl<C: HttpClientTrait> EncoderServiceEmbeddingProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_ENCODER_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dimensions: DEFAULT_ENCODER_DIMENSIONS,
        }
    }

    /// Override the dimensionality when the sidecar serves another model
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn encode_url(&self) -> String {
        format!("{}/encode", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct EncodeResponse {
    embedding: Vec<Vec<f32>>,
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for EncoderServiceEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let body = serde_json::json!({ "text": request.inputs() });

        let json = self
            .client
            .post_json(
                &self.encode_url(),
                vec![("Content-Type", "application/json")],
                &body,
            )
            .await
            .map_err(|e| attribute_to(self.provider_name(), e))?;

        let response: EncodeResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding_unavailable(
                self.provider_name(),
                format!("Failed to parse encode response: {}", e),
            )
        })?;

        // The sidecar answers positionally
        Ok(EmbeddingResponse::from_ordered(None, response.embedding))
    }

    fn provider_name(&self) -> &'static str {
        "encoder"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
