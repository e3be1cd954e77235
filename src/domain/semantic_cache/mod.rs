//! Semantic cache domain configuration
//!
//! The cache deduplicates text chunks by embedding similarity and keeps
//! them for a bounded time-to-live.

mod config;

pub use config::SemanticCacheConfig;
