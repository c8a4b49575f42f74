//! Metrics collection and export module

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Submission metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub submissions_total: IntCounter,
    pub submissions_confirmed: IntCounter,
    pub submissions_exhausted: IntCounter,
    pub submission_failures: IntCounterVec,
    pub fee_escalations: IntCounter,
    pub broadcasts_total: IntCounter,

    // Histograms
    pub confirmation_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let submissions_total = IntCounter::with_opts(Opts::new(
            "submissions_total",
            "Number of submit calls started",
        ))?;

        let submissions_confirmed = IntCounter::with_opts(Opts::new(
            "submissions_confirmed_total",
            "Number of submit calls that ended with a mined transaction",
        ))?;

        let submissions_exhausted = IntCounter::with_opts(Opts::new(
            "submissions_exhausted_total",
            "Number of submit calls that ran out of attempts",
        ))?;

        let submission_failures = IntCounterVec::new(
            Opts::new(
                "submission_failures_total",
                "Failed outer attempts by error category",
            ),
            &["category"],
        )?;

        let fee_escalations = IntCounter::with_opts(Opts::new(
            "fee_escalations_total",
            "Resubmissions at the same nonce after a confirmation timeout",
        ))?;

        let broadcasts_total = IntCounter::with_opts(Opts::new(
            "broadcasts_total",
            "Transactions handed to the node, including resubmissions",
        ))?;

        let confirmation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "confirmation_latency_seconds",
                "Time from first broadcast to inclusion",
            )
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 180.0, 360.0, 900.0]),
        )?;

        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(submissions_confirmed.clone()))?;
        registry.register(Box::new(submissions_exhausted.clone()))?;
        registry.register(Box::new(submission_failures.clone()))?;
        registry.register(Box::new(fee_escalations.clone()))?;
        registry.register(Box::new(broadcasts_total.clone()))?;
        registry.register(Box::new(confirmation_latency.clone()))?;

        Ok(Self {
            registry,
            submissions_total,
            submissions_confirmed,
            submissions_exhausted,
            submission_failures,
            fee_escalations,
            broadcasts_total,
            confirmation_latency,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_failure(&self, category: &str) {
        self.submission_failures.with_label_values(&[category]).inc();
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
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
