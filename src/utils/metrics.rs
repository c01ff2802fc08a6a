//! Observability and Metrics
//!
//! Counters describing what the matching pipeline has seen.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Classification metrics
#[derive(Debug)]
pub struct Metrics {
    /// Flows offered to the matching pipeline
    pub flows_total: AtomicU64,
    /// Flows claimed by some matcher
    pub matches_total: AtomicU64,
    /// Flows no matcher claimed
    pub mismatches_total: AtomicU64,
    /// Individual matcher evaluations
    pub evaluations_total: AtomicU64,
    /// I/O failures while matching
    pub io_errors: AtomicU64,
    /// Matching deadlines that expired
    pub timeouts: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            flows_total: AtomicU64::new(0),
            matches_total: AtomicU64::new(0),
            mismatches_total: AtomicU64::new(0),
            evaluations_total: AtomicU64::new(0),
            io_errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn flow_offered(&self) {
        self.flows_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flow_matched(&self) {
        self.matches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flow_unmatched(&self) {
        self.mismatches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn matcher_evaluated(&self) {
        self.evaluations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn io_error(&self) {
        self.io_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            flows_total: self.flows_total.load(Ordering::Relaxed),
            matches_total: self.matches_total.load(Ordering::Relaxed),
            mismatches_total: self.mismatches_total.load(Ordering::Relaxed),
            evaluations_total: self.evaluations_total.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            flows_total = snapshot.flows_total,
            matches_total = snapshot.matches_total,
            mismatches_total = snapshot.mismatches_total,
            evaluations_total = snapshot.evaluations_total,
            io_errors = snapshot.io_errors,
            timeouts = snapshot.timeouts,
            uptime_seconds = snapshot.uptime_seconds,
            "Sniffer metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub flows_total: u64,
    pub matches_total: u64,
    pub mismatches_total: u64,
    pub evaluations_total: u64,
    pub io_errors: u64,
    pub timeouts: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
