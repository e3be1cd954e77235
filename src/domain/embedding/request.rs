//! Embedding request types

use serde::{Deserialize, Serialize};

/// Request to embed an ordered batch of text chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text chunks, in the order their vectors must be returned
    inputs: Vec<String>,
    /// Model override; providers fall back to their configured model
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a request for a batch of chunks
    pub fn new(inputs: Vec<String>) -> Self {
        Self {
            inputs,
            model: None,
        }
    }

    /// Create a request for a single chunk
    pub fn single(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Get the inputs
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Get the model override
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}
