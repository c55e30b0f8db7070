//! Translation counters for one controller.
//!
//! Tracks cache hits/misses and provider calls/failures so a reader session
//! can report how much of the chapter came from the cache.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-controller translation counters.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Paragraphs served from the cache
    cache_hits: AtomicUsize,

    /// Paragraphs that needed a provider call
    cache_misses: AtomicUsize,

    /// Provider calls made
    api_calls: AtomicUsize,

    /// Provider calls that failed
    api_failures: AtomicUsize,
}

impl TranslationMetrics {
    /// Create a set of counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph was served from the cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A paragraph had no cached translation.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A provider call is about to be made.
    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// A provider call failed or returned an unusable result.
    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Cache hits so far.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Cache misses so far.
    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Provider calls so far.
    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    /// Failed provider calls so far.
    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    /// Snapshot of the counters with derived rates.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let cache_hit_rate = percentage(hits, hits + misses);

        let calls = self.api_calls();
        let failures = self.api_failures();
        let api_success_rate = percentage(calls.saturating_sub(failures), calls);

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            api_calls: calls,
            api_failures: failures,
            api_success_rate,
        }
    }

    /// Zero every counter. Called when the reader is reset.
    pub fn reset(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.api_calls.store(0, Ordering::Relaxed);
        self.api_failures.store(0, Ordering::Relaxed);
    }
}

/// Share of `part` in `total` as a percentage; zero when `total` is zero.
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64) * 100.0
}

/// Serializable snapshot of [`TranslationMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Percentage (0-100)
    pub cache_hit_rate: f64,
    pub api_calls: usize,
    pub api_failures: usize,
    /// Percentage (0-100)
    pub api_success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();

        assert_eq!(report.cache_hits, 0);
        assert_eq!(report.cache_hit_rate, 0.0);
        assert_eq!(report.api_calls, 0);
        assert_eq!(report.api_success_rate, 0.0);
    }

    #[test]
    fn test_report_cache_hit_rate() {
        let metrics = TranslationMetrics::new();

        // 3 hits, 1 miss = 75% hit rate
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let report = metrics.report();
        assert_eq!(report.cache_hits, 3);
        assert_eq!(report.cache_misses, 1);
        assert_eq!(report.cache_hit_rate, 75.0);
    }

    #[test]
    fn test_report_api_success_rate() {
        let metrics = TranslationMetrics::new();

        for _ in 0..4 {
            metrics.record_api_call();
        }
        metrics.record_api_failure();

        let report = metrics.report();
        assert_eq!(report.api_calls, 4);
        assert_eq!(report.api_failures, 1);
        assert_eq!(report.api_success_rate, 75.0);
    }

    #[test]
    fn test_instances_are_independent() {
        let first = TranslationMetrics::new();
        let second = TranslationMetrics::new();
        first.record_api_call();

        assert_eq!(first.api_calls(), 1);
        assert_eq!(second.api_calls(), 0);
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let metrics = TranslationMetrics::new();
        metrics.record_cache_hit();
        metrics.record_api_failure();
        metrics.reset();

        assert_eq!(metrics.cache_hits(), 0);
        assert_eq!(metrics.api_failures(), 0);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = TranslationMetrics::new();
        metrics.record_cache_miss();
        metrics.record_api_call();

        let json = serde_json::to_value(metrics.report()).unwrap();
        assert_eq!(json["cache_misses"], 1);
        assert_eq!(json["api_success_rate"], 100.0);
    }
}
