//! Translation metrics and observability module.
//!
//! Tracks field-cache and response-cache hit rates, cache backend failures,
//! and translation provider attempts. One instance is created per application
//! and shared through an `Arc`; there is no process-wide singleton, so tests
//! get isolated counters.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for cache and translation activity.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    field_cache_hits: AtomicUsize,
    field_cache_misses: AtomicUsize,
    response_cache_hits: AtomicUsize,
    response_cache_misses: AtomicUsize,

    /// Cache backend calls that failed and were degraded to store reads
    cache_errors: AtomicUsize,

    /// Provider calls made while generating translations
    translation_attempts: AtomicUsize,

    /// Provider calls that ended in a fallback to the source text
    translation_failures: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_field_hit(&self) {
        self.field_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_field_miss(&self) {
        self.field_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response_hit(&self) {
        self.response_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response_miss(&self) {
        self.response_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translation_attempt(&self) {
        self.translation_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translation_failure(&self) {
        self.translation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn field_cache_hits(&self) -> usize {
        self.field_cache_hits.load(Ordering::Relaxed)
    }

    pub fn field_cache_misses(&self) -> usize {
        self.field_cache_misses.load(Ordering::Relaxed)
    }

    pub fn response_cache_hits(&self) -> usize {
        self.response_cache_hits.load(Ordering::Relaxed)
    }

    pub fn response_cache_misses(&self) -> usize {
        self.response_cache_misses.load(Ordering::Relaxed)
    }

    pub fn cache_errors(&self) -> usize {
        self.cache_errors.load(Ordering::Relaxed)
    }

    pub fn translation_attempts(&self) -> usize {
        self.translation_attempts.load(Ordering::Relaxed)
    }

    pub fn translation_failures(&self) -> usize {
        self.translation_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let field_hits = self.field_cache_hits();
        let field_misses = self.field_cache_misses();
        let response_hits = self.response_cache_hits();
        let response_misses = self.response_cache_misses();

        let attempts = self.translation_attempts();
        let failures = self.translation_failures();
        let translation_success_rate = if attempts > 0 {
            (attempts.saturating_sub(failures) as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            field_cache_hits: field_hits,
            field_cache_misses: field_misses,
            field_cache_hit_rate: hit_rate(field_hits, field_misses),
            response_cache_hits: response_hits,
            response_cache_misses: response_misses,
            response_cache_hit_rate: hit_rate(response_hits, response_misses),
            cache_errors: self.cache_errors(),
            translation_attempts: attempts,
            translation_failures: failures,
            translation_success_rate,
        }
    }
}

/// Hit rate as a percentage (0-100); zero when nothing was looked up.
fn hit_rate(hits: usize, misses: usize) -> f64 {
    let total = hits + misses;
    if total > 0 {
        (hits as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Snapshot of the current counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub field_cache_hits: usize,
    pub field_cache_misses: usize,
    pub field_cache_hit_rate: f64,
    pub response_cache_hits: usize,
    pub response_cache_misses: usize,
    pub response_cache_hit_rate: f64,
    pub cache_errors: usize,
    pub translation_attempts: usize,
    pub translation_failures: usize,
    pub translation_success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_new_metrics_start_at_zero() {
        let metrics = TranslationMetrics::new();

        assert_eq!(metrics.field_cache_hits(), 0);
        assert_eq!(metrics.field_cache_misses(), 0);
        assert_eq!(metrics.response_cache_hits(), 0);
        assert_eq!(metrics.cache_errors(), 0);
        assert_eq!(metrics.translation_attempts(), 0);
    }

    #[test]
    fn test_record_field_hit_and_miss() {
        let metrics = TranslationMetrics::new();

        metrics.record_field_hit();
        metrics.record_field_hit();
        metrics.record_field_miss();

        assert_eq!(metrics.field_cache_hits(), 2);
        assert_eq!(metrics.field_cache_misses(), 1);
    }

    #[test]
    fn test_instances_are_independent() {
        let first = TranslationMetrics::new();
        let second = TranslationMetrics::new();

        first.record_response_hit();

        assert_eq!(first.response_cache_hits(), 1);
        assert_eq!(second.response_cache_hits(), 0);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();

        assert_eq!(report.field_cache_hit_rate, 0.0);
        assert_eq!(report.response_cache_hit_rate, 0.0);
        assert_eq!(report.translation_success_rate, 0.0);
    }

    #[test]
    fn test_report_field_hit_rate() {
        let metrics = TranslationMetrics::new();

        // 3 hits, 1 miss = 75% hit rate
        metrics.record_field_hit();
        metrics.record_field_hit();
        metrics.record_field_hit();
        metrics.record_field_miss();

        let report = metrics.report();
        assert_eq!(report.field_cache_hits, 3);
        assert_eq!(report.field_cache_misses, 1);
        assert_eq!(report.field_cache_hit_rate, 75.0);
    }

    #[test]
    fn test_report_translation_success_rate() {
        let metrics = TranslationMetrics::new();

        // 4 attempts, 1 failure = 75% success rate
        for _ in 0..4 {
            metrics.record_translation_attempt();
        }
        metrics.record_translation_failure();

        let report = metrics.report();
        assert_eq!(report.translation_attempts, 4);
        assert_eq!(report.translation_failures, 1);
        assert_eq!(report.translation_success_rate, 75.0);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = TranslationMetrics::new();
        metrics.record_cache_error();

        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["cache_errors"], 1);
        assert!(json.get("response_cache_hit_rate").is_some());
    }
}
