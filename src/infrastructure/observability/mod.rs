//! Observability infrastructure - metrics emitted by the cache

mod metrics;

pub use metrics::{record_index_error, record_ingest, record_query, IngestMetricParams};
