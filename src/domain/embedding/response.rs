//! Embedding response types

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A single embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// Index of the input chunk this vector belongs to
    index: usize,
    /// The embedding vector
    embedding: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding
    pub fn new(index: usize, embedding: Vec<f32>) -> Self {
        Self { index, embedding }
    }

    /// Get the index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the embedding vector
    pub fn vector(&self) -> &[f32] {
        &self.embedding
    }

    /// Get the embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }

    /// Consume and return the vector
    pub fn into_vector(self) -> Vec<f32> {
        self.embedding
    }
}

/// Calculate cosine similarity between two vectors
///
/// Returns 0.0 for empty or zero-norm vectors, for length mismatches and
/// for non-finite components.
///
/// Accumulates in f64 so that squaring any finite f32 cannot overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot_product, norm_a, norm_b) = a.iter().zip(b.iter()).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a.sqrt() * norm_b.sqrt());
    if !similarity.is_finite() {
        return 0.0;
    }

    similarity.clamp(-1.0, 1.0) as f32
}

/// Response from an embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Model used, when the provider reports one
    model: Option<String>,
    /// Generated embeddings
    data: Vec<Embedding>,
}

impl EmbeddingResponse {
    /// Create a new embedding response
    pub fn new(model: Option<String>, data: Vec<Embedding>) -> Self {
        Self { model, data }
    }

    /// Build a response from vectors given in input order
    pub fn from_ordered(model: Option<String>, vectors: Vec<Vec<f32>>) -> Self {
        let data = vectors
            .into_iter()
            .enumerate()
            .map(|(index, vector)| Embedding::new(index, vector))
            .collect();

        Self::new(model, data)
    }

    /// Get the model used
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Get all embeddings
    pub fn embeddings(&self) -> &[Embedding] {
        &self.data
    }

    /// Number of embeddings
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the response and return vectors positionally aligned with the
    /// request inputs
    ///
    /// Fails unless every input index `0..expected` is present exactly once.
    pub fn into_ordered_vectors(
        self,
        provider: &str,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        if self.data.len() != expected {
            return Err(DomainError::embedding_unavailable(
                provider,
                format!(
                    "expected {} embeddings, received {}",
                    expected,
                    self.data.len()
                ),
            ));
        }

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

        for embedding in self.data {
            let index = embedding.index();
            let slot = slots.get_mut(index).ok_or_else(|| {
                DomainError::embedding_unavailable(
                    provider,
                    format!("embedding index {} out of range", index),
                )
            })?;

            if slot.is_some() {
                return Err(DomainError::embedding_unavailable(
                    provider,
                    format!("duplicate embedding index {}", index),
                ));
            }

            *slot = Some(embedding.into_vector());
        }

        // Every slot is filled: count matched and no index repeated
        Ok(slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_creation() {
        let emb = Embedding::new(0, vec![0.1, 0.2, 0.3]);

        assert_eq!(emb.index(), 0);
        assert_eq!(emb.dimensions(), 3);
        assert_eq!(emb.vector(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!((similarity - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(similarity.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((similarity + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_scale_invariant() {
        let similarity = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((similarity - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        let empty: Vec<f32> = vec![];

        assert_eq!(cosine_similarity(&empty, &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_large_magnitudes() {
        let large = [1e20, 1e20, 0.0];
        let similarity = cosine_similarity(&large, &large);
        assert!((similarity - 1.0).abs() < 0.0001);

        let extreme = [f32::MAX, f32::MAX];
        let similarity = cosine_similarity(&extreme, &[-f32::MAX, -f32::MAX]);
        assert!((similarity + 1.0).abs() < 0.0001);

        let tiny = [1e-30, 0.0];
        let similarity = cosine_similarity(&tiny, &[2e-30, 0.0]);
        assert!((similarity - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_into_ordered_vectors_restores_input_order() {
        let response = EmbeddingResponse::new(
            None,
            vec![
                Embedding::new(2, vec![2.0]),
                Embedding::new(0, vec![0.0]),
                Embedding::new(1, vec![1.0]),
            ],
        );

        let vectors = response.into_ordered_vectors("test", 3).unwrap();

        assert_eq!(vectors, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_into_ordered_vectors_count_mismatch() {
        let response = EmbeddingResponse::from_ordered(None, vec![vec![0.0]]);

        let err = response.into_ordered_vectors("test", 2).unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingUnavailable { .. }));
    }

    #[test]
    fn test_into_ordered_vectors_duplicate_index() {
        let response = EmbeddingResponse::new(
            None,
            vec![Embedding::new(0, vec![0.0]), Embedding::new(0, vec![1.0])],
        );

        let err = response.into_ordered_vectors("test", 2).unwrap_err();
        assert!(err.to_string().contains("duplicate embedding index 0"));
    }

    #[test]
    fn test_into_ordered_vectors_index_out_of_range() {
        let response = EmbeddingResponse::new(
            None,
            vec![Embedding::new(0, vec![0.0]), Embedding::new(5, vec![1.0])],
        );

        let err = response.into_ordered_vectors("test", 2).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
