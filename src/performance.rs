use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Request counters shared by every clone of a request client.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    network_attempts: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    total_response_ms: AtomicU64,
}

/// Point-in-time copy of [`RequestMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub network_attempts: u64,
    pub retries: u64,
    pub failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub average_response_time_ms: f64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self, response_time: Duration) {
        self.network_attempts.fetch_add(1, Ordering::Relaxed);
        let ms = u64::try_from(response_time.as_millis()).unwrap_or(u64::MAX);
        self.total_response_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn network_attempts(&self) -> u64 {
        self.network_attempts.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let attempts = self.network_attempts.load(Ordering::Relaxed);
        let total_ms = self.total_response_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            network_attempts: attempts,
            retries: self.retries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            average_response_time_ms: if attempts == 0 {
                0.0
            } else {
                total_ms as f64 / attempts as f64
            },
        }
    }
}

impl MetricsSnapshot {
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::new();

        // Test initial state
        let initial = metrics.snapshot();
        assert_eq!(initial.network_attempts, 0);
        assert_eq!(initial.cache_hit_rate(), 0.0);
        assert_eq!(initial.average_response_time_ms, 0.0);

        metrics.record_attempt(Duration::from_millis(100));
        metrics.record_attempt(Duration::from_millis(200));
        metrics.record_retry();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.network_attempts, 2);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.average_response_time_ms, 150.0);

        metrics.record_cache_hit();
        metrics.record_cache_miss();
        assert_eq!(metrics.snapshot().cache_hit_rate(), 0.5);

        metrics.record_cache_hit();
        assert_eq!(metrics.snapshot().cache_hit_rate(), 2.0 / 3.0);
    }
}
