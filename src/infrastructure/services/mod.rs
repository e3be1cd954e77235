//! Infrastructure services

mod dedup_pipeline;
mod semantic_cache_service;

pub use dedup_pipeline::{DedupPipeline, IngestSummary};
pub use semantic_cache_service::SemanticCacheService;
