//! Domain layer - Core types, traits and errors

pub mod document;
pub mod embedding;
pub mod error;
pub mod semantic_cache;
pub mod vector_index;

pub use document::{ContentId, Document, SIMILARITY_UNSET};
pub use embedding::{
    cosine_similarity, Embedding, EmbeddingProvider, EmbeddingProviderExt, EmbeddingRequest,
    EmbeddingResponse,
};
pub use error::{ensure_vector, DomainError};
pub use semantic_cache::SemanticCacheConfig;
pub use vector_index::{CacheEntry, IndexEntry, VectorIndex};
