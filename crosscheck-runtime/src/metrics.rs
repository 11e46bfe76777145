//! Runtime metrics
//!
//! Counters and per-backend call accounting backing the health and stats
//! surfaces. The core owns the data, not the transport.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crosscheck_core::{BackendStatus, BackendVerdict};

#[derive(Default)]
struct BackendCounters {
    ok: AtomicU64,
    timeout: AtomicU64,
    error: AtomicU64,
}

/// Collector for request and backend metrics
pub struct Metrics {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    deduped: AtomicU64,
    analyses: AtomicU64,
    backends: DashMap<String, BackendCounters>,
    durations_secs: Mutex<Vec<f64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            deduped: AtomicU64::new(0),
            analyses: AtomicU64::new(0),
            backends: DashMap::new(),
            durations_secs: Mutex::new(Vec::new()),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A request served by joining an in-flight computation
    pub fn record_deduped(&self) {
        self.deduped.fetch_add(1, Ordering::Relaxed);
    }

    /// A completed miss-path computation and its duration
    pub fn record_analysis(&self, duration_secs: f64) {
        self.analyses.fetch_add(1, Ordering::Relaxed);
        self.durations_secs.lock().push(duration_secs);
    }

    /// Account one backend call by its reported status
    pub fn record_backend(&self, report: &BackendVerdict) {
        let counters = self.backends.entry(report.backend.clone()).or_default();
        let counter = match report.status {
            BackendStatus::Ok => &counters.ok,
            BackendStatus::Timeout => &counters.timeout,
            BackendStatus::Error => &counters.error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut backends: Vec<BackendSnapshot> = self
            .backends
            .iter()
            .map(|entry| BackendSnapshot {
                backend: entry.key().clone(),
                ok: entry.value().ok.load(Ordering::Relaxed),
                timeout: entry.value().timeout.load(Ordering::Relaxed),
                error: entry.value().error.load(Ordering::Relaxed),
            })
            .collect();
        backends.sort_by(|a, b| a.backend.cmp(&b.backend));

        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            deduped: self.deduped.load(Ordering::Relaxed),
            analyses: self.analyses.load(Ordering::Relaxed),
            backends,
            durations: DurationSummary::of(&self.durations_secs.lock()),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-backend call counts by outcome
#[derive(Debug, Clone, Serialize)]
pub struct BackendSnapshot {
    pub backend: String,
    pub ok: u64,
    pub timeout: u64,
    pub error: u64,
}

/// Summary of recorded analysis durations
#[derive(Debug, Clone, Serialize)]
pub struct DurationSummary {
    pub count: usize,
    pub sum_secs: f64,
    pub avg_secs: f64,
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DurationSummary {
    fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                sum_secs: 0.0,
                avg_secs: 0.0,
                min_secs: 0.0,
                max_secs: 0.0,
            };
        }

        let sum: f64 = values.iter().sum();
        Self {
            count: values.len(),
            sum_secs: sum,
            avg_secs: sum / values.len() as f64,
            min_secs: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max_secs: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Point-in-time view of all collected metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub cache_hits: u64,
    pub deduped: u64,
    pub analyses: u64,
    pub backends: Vec<BackendSnapshot>,
    pub durations: DurationSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_core::Verdict;

    #[test]
    fn test_backend_accounting_by_status() {
        let metrics = Metrics::new();
        metrics.record_backend(&BackendVerdict::ok(
            "gemini",
            Verdict::True,
            0.9,
            "r".to_string(),
            100,
        ));
        metrics.record_backend(&BackendVerdict::timeout("gemini", 5000));
        metrics.record_backend(&BackendVerdict::error("llama", "503", 40));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.backends.len(), 2);

        let gemini = &snapshot.backends[0];
        assert_eq!(gemini.backend, "gemini");
        assert_eq!((gemini.ok, gemini.timeout, gemini.error), (1, 1, 0));

        let llama = &snapshot.backends[1];
        assert_eq!((llama.ok, llama.timeout, llama.error), (0, 0, 1));
    }

    #[test]
    fn test_duration_summary() {
        let metrics = Metrics::new();
        metrics.record_analysis(1.0);
        metrics.record_analysis(3.0);

        let durations = metrics.snapshot().durations;
        assert_eq!(durations.count, 2);
        assert!((durations.avg_secs - 2.0).abs() < 1e-9);
        assert_eq!(durations.min_secs, 1.0);
        assert_eq!(durations.max_secs, 3.0);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot.requests, 0);
        assert_eq!(snapshot.durations.count, 0);
        assert!(snapshot.backends.is_empty());
    }
}
