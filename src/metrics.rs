//! Rate source health metrics
//!
//! Tracks latency percentiles and success rates for the primary and fallback
//! providers, plus cache hit counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics for a single rate source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetrics {
    /// Name of the provider behind the source
    pub provider_name: String,
    /// 50th percentile latency of successful requests in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful requests in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of requests tracked
    pub total_requests: u64,
    /// Number of failed requests
    pub failed_requests: u64,
}

impl SourceMetrics {
    /// Creates metrics with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
        }
    }
}

/// Snapshot of everything the engine measures
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterMetrics {
    pub primary: SourceMetrics,
    pub fallback: SourceMetrics,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl ConverterMetrics {
    /// Share of table lookups served from cache
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Samples {
    window: VecDeque<(f64, bool)>,
    total: u64,
    failed: u64,
}

/// Collects request outcomes for one source
pub struct MetricsCollector {
    provider_name: String,
    samples: RwLock<Samples>,
}

impl MetricsCollector {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            samples: RwLock::new(Samples {
                window: VecDeque::with_capacity(MAX_SAMPLES),
                ..Samples::default()
            }),
        }
    }

    /// Records a request with its duration and success status
    pub async fn record_request(&self, duration: Duration, success: bool) {
        let duration_ms = duration.as_secs_f64() * 1000.0;
        let mut samples = self.samples.write().await;
        samples.total += 1;
        if !success {
            samples.failed += 1;
        }
        if samples.window.len() >= MAX_SAMPLES {
            samples.window.pop_front();
        }
        samples.window.push_back((duration_ms, success));
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> SourceMetrics {
        let samples = self.samples.read().await;
        if samples.window.is_empty() {
            return SourceMetrics::empty(&self.provider_name);
        }

        let mut latencies: Vec<f64> = samples
            .window
            .iter()
            .filter(|(_, success)| *success)
            .map(|(ms, _)| *ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        SourceMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate: (samples.total - samples.failed) as f64 / samples.total as f64,
            total_requests: samples.total,
            failed_requests: samples.failed,
        }
    }
}

/// Lock-free cache hit/miss counters
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheCounters {
    pub fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("exchangerate-api");

        collector.record_request(Duration::from_millis(100), true).await;
        collector.record_request(Duration::from_millis(200), true).await;
        collector.record_request(Duration::from_millis(150), false).await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.provider_name, "exchangerate-api");
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.failed_requests, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
        assert!(metrics.latency_p99_ms >= metrics.latency_p50_ms);
    }

    #[tokio::test]
    async fn test_window_is_bounded() {
        let collector = MetricsCollector::new("frankfurter");
        for _ in 0..(MAX_SAMPLES + 20) {
            collector.record_request(Duration::from_millis(10), true).await;
        }
        assert_eq!(collector.samples.read().await.window.len(), MAX_SAMPLES);
        assert_eq!(collector.get_metrics().await.total_requests, (MAX_SAMPLES + 20) as u64);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        // index 4.5 rounds up
        assert_eq!(percentile(&values, 50.0), 6.0);
        assert_eq!(percentile(&values, 99.0), 10.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_cache_counters() {
        let counters = CacheCounters::default();
        counters.record(true);
        counters.record(true);
        counters.record(false);
        assert_eq!(counters.hits(), 2);
        assert_eq!(counters.misses(), 1);
    }
}
