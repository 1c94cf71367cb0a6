//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    CACHE_EVICTIONS_TOTAL, CACHE_EXPIRATIONS_TOTAL, COMPILE_CACHE_HITS_TOTAL,
    COMPILE_CACHE_MISSES_TOTAL, COMPILE_FAILURES_TOTAL, CONTEXT_VALIDATION_FAILURES_TOTAL, DOCUMENTS_RENDERED_TOTAL,
    EVALUATION_FAILURES_TOTAL, SECTIONS_RENDERED_TOTAL, SECTION_RENDER_LATENCY,
    TEMPLATES_COMPILED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording compilation metrics
pub struct CompileMetrics;

impl CompileMetrics {
    pub fn record_compiled() {
        TEMPLATES_COMPILED_TOTAL.inc();
    }

    pub fn record_cache_hit() {
        COMPILE_CACHE_HITS_TOTAL.inc();
    }

    pub fn record_cache_miss() {
        COMPILE_CACHE_MISSES_TOTAL.inc();
    }

    pub fn record_failure() {
        COMPILE_FAILURES_TOTAL.inc();
    }
}

/// Helper struct for recording cache metrics
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_eviction(cache: &str) {
        CACHE_EVICTIONS_TOTAL.with_label_values(&[cache]).inc();
    }

    pub fn record_expirations(cache: &str, count: u64) {
        if count > 0 {
            CACHE_EXPIRATIONS_TOTAL.with_label_values(&[cache]).inc_by(count);
        }
    }
}

/// Helper struct for recording section and document metrics
pub struct RenderMetrics;

impl RenderMetrics {
    /// Record an included section and its render time
    pub fn record_included(seconds: f64) {
        SECTIONS_RENDERED_TOTAL.with_label_values(&["included"]).inc();
        SECTION_RENDER_LATENCY.observe(seconds);
    }

    pub fn record_excluded() {
        SECTIONS_RENDERED_TOTAL.with_label_values(&["excluded"]).inc();
    }

    pub fn record_failed() {
        SECTIONS_RENDERED_TOTAL.with_label_values(&["failed"]).inc();
    }

    pub fn record_document() {
        DOCUMENTS_RENDERED_TOTAL.inc();
    }

    pub fn record_invalid_context() {
        CONTEXT_VALIDATION_FAILURES_TOTAL.inc();
    }
}

/// Helper struct for recording recovered token-level failures
pub struct EvaluationMetrics;

impl EvaluationMetrics {
    /// A helper call failed and its tag was left in place
    pub fn record_helper_failure() {
        EVALUATION_FAILURES_TOTAL.with_label_values(&["helper"]).inc();
    }

    /// A partial reference could not be resolved
    pub fn record_missing_partial() {
        EVALUATION_FAILURES_TOTAL.with_label_values(&["partial"]).inc();
    }

    /// Partial nesting exceeded the configured depth
    pub fn record_depth_exceeded() {
        EVALUATION_FAILURES_TOTAL.with_label_values(&["depth"]).inc();
    }
}
