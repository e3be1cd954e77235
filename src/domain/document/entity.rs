//! Document entity

use serde::{Deserialize, Serialize};

/// Similarity carried by documents that have not been compared to a query
pub const SIMILARITY_UNSET: f32 = -1.0;

/// A text chunk together with its embedding vector
///
/// `similarity` is only meaningful on documents returned from a query, where
/// it holds the cosine similarity to the query vector. Documents written to
/// the cache report [`SIMILARITY_UNSET`]; a query result whose real score is
/// -1.0 still reports [`Document::has_similarity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque source identifier (URL, path, ...)
    locator: String,
    /// The chunk of content the vector represents
    text: String,
    /// Embedding vector
    vector: Vec<f32>,
    /// Cosine similarity to the last query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    similarity: Option<f32>,
}

impl Document {
    /// Create a new document that has not been compared to any query
    pub fn new(locator: impl Into<String>, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            locator: locator.into(),
            text: text.into(),
            vector,
            similarity: None,
        }
    }

    /// Set the similarity score
    pub fn with_similarity(mut self, similarity: f32) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Forget the score from the last query
    pub fn clear_similarity(&mut self) {
        self.similarity = None;
    }

    /// Get the source locator
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Get the text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the embedding vector
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Get the vector dimensionality
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    /// Get the similarity score, or [`SIMILARITY_UNSET`] when not compared
    pub fn similarity(&self) -> f32 {
        self.similarity.unwrap_or(SIMILARITY_UNSET)
    }

    /// Similarity score, if this document came from a query
    pub fn similarity_score(&self) -> Option<f32> {
        self.similarity
    }

    /// Whether this document carries a score from a query
    pub fn has_similarity(&self) -> bool {
        self.similarity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new("https://example.com/a", "hello", vec![0.1, 0.2, 0.3]);

        assert_eq!(doc.locator(), "https://example.com/a");
        assert_eq!(doc.text(), "hello");
        assert_eq!(doc.vector(), &[0.1, 0.2, 0.3]);
        assert_eq!(doc.dimensions(), 3);
        assert_eq!(doc.similarity(), SIMILARITY_UNSET);
        assert!(!doc.has_similarity());
    }

    #[test]
    fn test_similarity_roundtrip() {
        let mut doc = Document::new("a", "b", vec![1.0]).with_similarity(0.42);
        assert!(doc.has_similarity());
        assert!((doc.similarity() - 0.42).abs() < f32::EPSILON);

        doc.clear_similarity();
        assert_eq!(doc.similarity(), SIMILARITY_UNSET);
        assert!(!doc.has_similarity());
    }

    #[test]
    fn test_opposite_score_is_still_a_score() {
        let doc = Document::new("a", "b", vec![-1.0]).with_similarity(-1.0);

        assert!(doc.has_similarity());
        assert_eq!(doc.similarity_score(), Some(-1.0));
        assert_eq!(doc.similarity(), -1.0);
    }

    #[test]
    fn test_serialize_omits_missing_similarity() {
        let json = serde_json::to_value(Document::new("a", "b", vec![1.0])).unwrap();
        assert!(json.get("similarity").is_none());

        let json = serde_json::to_value(Document::new("a", "b", vec![1.0]).with_similarity(0.5))
            .unwrap();
        assert_eq!(json["similarity"], 0.5);
    }

    #[test]
    fn test_deserialize_without_similarity() {
        let json = r#"{"locator":"doc.md","text":"chunk","vector":[0.5,0.5]}"#;
        let doc: Document = serde_json::from_str(json).unwrap();

        assert_eq!(doc.locator(), "doc.md");
        assert_eq!(doc.similarity(), SIMILARITY_UNSET);
        assert!(!doc.has_similarity());
    }
}
