//! Cache metrics
//!
//! Emitted through the `metrics` facade; a binary that wants them exported
//! installs a recorder. Without one these calls are no-ops.

use std::time::Duration;

use metrics::{counter, histogram};

/// Parameters for ingest metrics
pub struct IngestMetricParams<'a> {
    pub source: &'a str,
    pub submitted: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub duration: Duration,
}

/// Record the outcome of one ingest batch
pub fn record_ingest(params: IngestMetricParams<'_>) {
    let labels = [("source", params.source.to_string())];

    counter!("semantic_cache_documents_submitted_total", &labels)
        .increment(params.submitted as u64);
    counter!("semantic_cache_documents_inserted_total", &labels).increment(params.inserted as u64);
    counter!("semantic_cache_documents_dropped_total", &labels)
        .increment(params.duplicates as u64);
    histogram!("semantic_cache_ingest_duration_seconds", &labels)
        .record(params.duration.as_secs_f64());
}

/// Record one nearest-neighbour query
pub fn record_query(hits: usize, duration: Duration) {
    counter!("semantic_cache_queries_total").increment(1);

    if hits == 0 {
        counter!("semantic_cache_empty_queries_total").increment(1);
    }

    histogram!("semantic_cache_query_duration_seconds").record(duration.as_secs_f64());
}

/// Record a failed index operation
pub fn record_index_error(operation: &'static str) {
    counter!("semantic_cache_index_errors_total", "operation" => operation).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_ingest(IngestMetricParams {
            source: "ingest",
            submitted: 3,
            inserted: 2,
            duplicates: 1,
            duration: Duration::from_millis(5),
        });
        record_query(0, Duration::from_millis(1));
        record_index_error("search");
    }
}
