//! Vector index domain models and traits
//!
//! The index stores documents keyed by content address and answers
//! cosine-similarity KNN queries over their vectors.

mod repository;

pub use repository::{CacheEntry, IndexEntry, VectorIndex};

#[cfg(test)]
pub use repository::MockVectorIndex;
