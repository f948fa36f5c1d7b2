//! Metrics collection for gateway calls.
//!
//! Thread-safe tracking of bytes sent, request count and timing, shared
//! between the upload coordinator and whoever reports on the transfer.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Metrics for a single part upload
#[derive(Debug, Clone)]
pub struct RequestMetric {
    /// Part number the request carried
    pub part_number: u32,
    /// Number of raw (unencoded) bytes transferred
    pub bytes: u64,
    /// Duration of the request
    pub duration: Duration,
}

/// Collector for transfer metrics.
#[derive(Debug, Default)]
pub struct TransferMetrics {
    total_bytes: AtomicU64,
    request_count: AtomicUsize,
    /// Nanoseconds spent waiting on the gateway
    total_request_time_ns: AtomicU64,
    requests: RwLock<Vec<RequestMetric>>,
    operation_start: RwLock<Option<Instant>>,
}

impl TransferMetrics {
    /// Create a new metrics collector wrapped in Arc for sharing
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Start timing an operation
    pub fn start_operation(&self) {
        if let Ok(mut start) = self.operation_start.write() {
            *start = Some(Instant::now());
        }
    }

    /// Record a completed part upload
    pub fn record_request(&self, part_number: u32, bytes: u64, duration: Duration) {
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_request_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);

        if let Ok(mut requests) = self.requests.write() {
            requests.push(RequestMetric {
                part_number,
                bytes,
                duration,
            });
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn total_request_time(&self) -> Duration {
        Duration::from_nanos(self.total_request_time_ns.load(Ordering::Relaxed))
    }

    /// Get elapsed time since operation start
    pub fn operation_elapsed(&self) -> Option<Duration> {
        self.operation_start.read().ok()?.map(|s| s.elapsed())
    }

    /// Average bytes per second across recorded requests
    pub fn throughput(&self) -> Option<f64> {
        let time = self.total_request_time();
        if time.is_zero() {
            return None;
        }
        Some(self.total_bytes() as f64 / time.as_secs_f64())
    }

    /// Get all individual request metrics
    pub fn requests(&self) -> Vec<RequestMetric> {
        self.requests
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.total_bytes.store(0, Ordering::Relaxed);
        self.request_count.store(0, Ordering::Relaxed);
        self.total_request_time_ns.store(0, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.write() {
            requests.clear();
        }
        if let Ok(mut start) = self.operation_start.write() {
            *start = None;
        }
    }
}
