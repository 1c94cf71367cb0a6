//! Prometheus metrics for the template engine.
//!
//! - Compilation metrics (templates compiled, compile cache hits/misses)
//! - Cache metrics (evictions, expirations per cache)
//! - Section rendering metrics (status counts, latency)
//! - Token-level evaluation failures

mod helpers;

pub use helpers::{encode_metrics, CacheMetrics, CompileMetrics, EvaluationMetrics, RenderMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "report_engine";

lazy_static! {
    // ============================================================================
    // Compilation Metrics
    // ============================================================================

    /// Templates compiled (cache misses that did real work)
    pub static ref TEMPLATES_COMPILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_templates_compiled_total", METRIC_PREFIX),
        "Total templates compiled"
    ).unwrap();

    /// Compile requests served from cache
    pub static ref COMPILE_CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_compile_cache_hits_total", METRIC_PREFIX),
        "Total compile requests served from the template cache"
    ).unwrap();

    /// Compile requests that had to build the template
    pub static ref COMPILE_CACHE_MISSES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_compile_cache_misses_total", METRIC_PREFIX),
        "Total compile requests not found in the template cache"
    ).unwrap();

    /// Compilations rejected as structurally invalid
    pub static ref COMPILE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_compile_failures_total", METRIC_PREFIX),
        "Total template compilations that failed validation"
    ).unwrap();

    // ============================================================================
    // Cache Metrics
    // ============================================================================

    /// LRU evictions by cache name
    pub static ref CACHE_EVICTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_cache_evictions_total", METRIC_PREFIX),
        "Total entries evicted because the cache was full",
        &["cache"]
    ).unwrap();

    /// TTL expirations by cache name
    pub static ref CACHE_EXPIRATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_cache_expirations_total", METRIC_PREFIX),
        "Total entries removed after their TTL elapsed",
        &["cache"]
    ).unwrap();

    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Sections rendered by outcome (included, excluded, failed)
    pub static ref SECTIONS_RENDERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_sections_rendered_total", METRIC_PREFIX),
        "Total sections processed by outcome",
        &["status"]
    ).unwrap();

    /// Time spent rendering one included section
    pub static ref SECTION_RENDER_LATENCY: Histogram = register_histogram!(
        format!("{}_section_render_latency_seconds", METRIC_PREFIX),
        "Section render latency in seconds",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    /// Documents assembled
    pub static ref DOCUMENTS_RENDERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_documents_rendered_total", METRIC_PREFIX),
        "Total documents rendered"
    ).unwrap();

    /// Render calls rejected by context validation
    pub static ref CONTEXT_VALIDATION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_context_validation_failures_total", METRIC_PREFIX),
        "Total render calls rejected because the context was invalid"
    ).unwrap();

    // ============================================================================
    // Evaluation Metrics
    // ============================================================================

    /// Recovered token-level failures (helper, partial, depth)
    pub static ref EVALUATION_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_evaluation_failures_total", METRIC_PREFIX),
        "Total expression, partial and block failures recovered during rendering",
        &["kind"]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        // Initialize some metrics first (lazy_static requires first access)
        TEMPLATES_COMPILED_TOTAL.inc();

        let result = encode_metrics();
        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.contains("report_engine_templates_compiled_total"));
    }

    #[test]
    fn test_render_metrics() {
        RenderMetrics::record_included(0.002);
        RenderMetrics::record_excluded();
        RenderMetrics::record_failed();
        RenderMetrics::record_document();
        // Just verify no panics
    }

    #[test]
    fn test_cache_metrics() {
        CacheMetrics::record_eviction("test");
        CacheMetrics::record_expirations("test", 3);
        assert!(CACHE_EXPIRATIONS_TOTAL.with_label_values(&["test"]).get() >= 3);
    }
}
