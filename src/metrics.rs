//! Metrics collection and export module

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub polls_total: IntCounter,
    pub fetch_failures_total: IntCounter,
    pub uploads_detected_total: IntCounter,
    pub notifications_sent_total: IntCounter,
    pub notifications_failed_total: IntCounter,
    pub transfers_departed_total: IntCounter,

    // Gauges
    pub active_uploads: IntGauge,
    pub notified_names: IntGauge,

    // Histograms
    pub fetch_latency: Histogram,
    pub notify_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let polls_total =
            IntCounter::with_opts(Opts::new("polls_total", "Number of poll cycles run"))?;

        let fetch_failures_total = IntCounter::with_opts(Opts::new(
            "fetch_failures_total",
            "Number of failed transfer list fetches",
        ))?;

        let uploads_detected_total = IntCounter::with_opts(Opts::new(
            "uploads_detected_total",
            "Number of uploads classified as newly detected",
        ))?;

        let notifications_sent_total = IntCounter::with_opts(Opts::new(
            "notifications_sent_total",
            "Number of notifications delivered",
        ))?;

        let notifications_failed_total = IntCounter::with_opts(Opts::new(
            "notifications_failed_total",
            "Number of notification deliveries that failed",
        ))?;

        let transfers_departed_total = IntCounter::with_opts(Opts::new(
            "transfers_departed_total",
            "Number of uploads that disappeared before reporting finished",
        ))?;

        let active_uploads = IntGauge::with_opts(Opts::new(
            "active_uploads",
            "Number of uploads currently tracked",
        ))?;

        let notified_names = IntGauge::with_opts(Opts::new(
            "notified_names",
            "Size of the notified file-name set",
        ))?;

        let fetch_latency = Histogram::with_opts(
            HistogramOpts::new("fetch_latency_seconds", "Transfer list fetch latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 30.0]),
        )?;

        let notify_latency = Histogram::with_opts(
            HistogramOpts::new("notify_latency_seconds", "Notification delivery latency")
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 30.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(polls_total.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(uploads_detected_total.clone()))?;
        registry.register(Box::new(notifications_sent_total.clone()))?;
        registry.register(Box::new(notifications_failed_total.clone()))?;
        registry.register(Box::new(transfers_departed_total.clone()))?;
        registry.register(Box::new(active_uploads.clone()))?;
        registry.register(Box::new(notified_names.clone()))?;
        registry.register(Box::new(fetch_latency.clone()))?;
        registry.register(Box::new(notify_latency.clone()))?;

        Ok(Self {
            registry,
            polls_total,
            fetch_failures_total,
            uploads_detected_total,
            notifications_sent_total,
            notifications_failed_total,
            transfers_departed_total,
            active_uploads,
            notified_names,
            fetch_latency,
            notify_latency,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
