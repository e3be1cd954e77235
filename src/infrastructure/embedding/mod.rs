//! Embedding provider implementations

mod encoder_service;
mod factory;
mod http_client;
mod openai;

pub use encoder_service::EncoderServiceEmbeddingProvider;
pub use factory::{EmbeddingBackend, EmbeddingConfig, EmbeddingProviderFactory};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiEmbeddingProvider;
