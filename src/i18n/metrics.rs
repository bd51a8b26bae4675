//! Translation metrics and observability module.
//!
//! Tracks provider traffic for the translation gateway: calls made, calls that
//! failed, calls that timed out, and requests answered without contacting the
//! provider at all.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one translation gateway.
///
/// Owned by the gateway (shared through an `Arc`) rather than global, so each
/// relay instance reports its own traffic.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of calls made to the translation provider
    provider_calls: AtomicUsize,

    /// Number of provider calls that returned an error (timeouts included)
    provider_failures: AtomicUsize,

    /// Number of provider calls abandoned because they exceeded the timeout
    timeouts: AtomicUsize,

    /// Number of requests answered locally (empty text, same source and target)
    skipped: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call to the translation provider.
    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed provider call.
    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a provider call that timed out. Also counts as a failure.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.record_provider_failure();
    }

    /// Record a request that never reached the provider.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> usize {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            provider_calls: calls,
            provider_failures: failures,
            timeouts: self.timeouts(),
            skipped: self.skipped(),
            provider_success_rate,
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub provider_calls: usize,
    pub provider_failures: usize,
    pub timeouts: usize,
    pub skipped: usize,

    /// Provider success rate as a percentage (0-100)
    pub provider_success_rate: f64,
}
