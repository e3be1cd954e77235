use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index unavailable: {message}")]
    IndexUnavailable { message: String },

    #[error("Embedding provider unavailable: {provider} - {message}")]
    EmbeddingUnavailable { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DomainError {
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn index_unavailable(message: impl Into<String>) -> Self {
        Self::IndexUnavailable {
            message: message.into(),
        }
    }

    pub fn embedding_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Transient infrastructure failures a caller may retry with backoff.
    ///
    /// The cache itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::IndexUnavailable { .. } | Self::EmbeddingUnavailable { .. }
        )
    }
}

/// Fails unless `vector` has exactly `expected` finite components
///
/// A wrong length is a `DimensionMismatch`; a NaN or infinite component is a
/// `Validation` error, since no similarity can be computed against it.
pub fn ensure_vector(expected: usize, vector: &[f32]) -> Result<(), DomainError> {
    if vector.len() != expected {
        return Err(DomainError::dimension_mismatch(expected, vector.len()));
    }

    if let Some(position) = vector.iter().position(|x| !x.is_finite()) {
        return Err(DomainError::validation(format!(
            "Vector component {} is not a finite number",
            position
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_error() {
        let error = DomainError::dimension_mismatch(384, 3);
        assert_eq!(error.to_string(), "Dimension mismatch: expected 384, got 3");
    }

    #[test]
    fn test_embedding_unavailable_error() {
        let error = DomainError::embedding_unavailable("openai", "HTTP 503");
        assert_eq!(
            error.to_string(),
            "Embedding provider unavailable: openai - HTTP 503"
        );
    }

    #[test]
    fn test_retryable_classes() {
        assert!(DomainError::index_unavailable("down").is_retryable());
        assert!(DomainError::embedding_unavailable("encoder", "down").is_retryable());
        assert!(!DomainError::dimension_mismatch(3, 2).is_retryable());
        assert!(!DomainError::configuration("bad").is_retryable());
    }

    #[test]
    fn test_ensure_vector_dimension() {
        assert!(ensure_vector(3, &[0.1, 0.2, 0.3]).is_ok());

        let err = ensure_vector(3, &[0.1, 0.2]).unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));

        let err = ensure_vector(3, &[0.1, 0.2, 0.3, 0.4]).unwrap_err();
        assert!(matches!(err, DomainError::DimensionMismatch { actual: 4, .. }));
    }

    #[test]
    fn test_ensure_vector_rejects_non_finite() {
        assert!(ensure_vector(2, &[1e20, f32::MAX]).is_ok());

        let err = ensure_vector(3, &[0.1, f32::NAN, 0.3]).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("component 1"));

        let err = ensure_vector(2, &[f32::INFINITY, 0.0]).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(!err.is_retryable());
    }
}
