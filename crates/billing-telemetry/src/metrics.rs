//! Prometheus metrics for the billing client.
//!
//! All metrics follow the naming convention: `pk_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Crate-local metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CONNECTION METRICS
    // =========================================================================

    /// Connection attempts by outcome
    pub static ref CONNECTION_ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("pk_connection_attempts_total", "Billing service connection attempts"),
        &["outcome"]  // outcome: started/connected/failed/coalesced/already_connected
    ).expect("metric creation failed");

    /// Caller operations by kind and outcome
    pub static ref OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("pk_connection_operations_total", "Billing operations by kind and outcome"),
        &["operation", "outcome"]  // outcome: success/failure/canceled/rejected/stale/discarded
    ).expect("metric creation failed");

    /// Completions dropped because their connection generation ended
    pub static ref STALE_COMPLETIONS: Counter = Counter::new(
        "pk_connection_stale_completions_total",
        "Late completions discarded after disconnect"
    ).expect("metric creation failed");

    // =========================================================================
    // VERIFICATION METRICS
    // =========================================================================

    /// Signature verifications by algorithm and result
    pub static ref SIGNATURE_VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("pk_verifier_verifications_total", "Purchase signature verifications"),
        &["algorithm", "result"]  // result: valid/invalid/error
    ).expect("metric creation failed");

    /// Signature verification duration
    pub static ref VERIFICATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pk_verifier_verification_duration_seconds",
            "Time spent verifying purchase signatures"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1])
    ).expect("metric creation failed");

    /// Purchases rejected because their signature did not match
    pub static ref PURCHASE_HIJACKS: Counter = Counter::new(
        "pk_parser_purchase_hijacks_total",
        "Purchases whose signature did not match the developer key"
    ).expect("metric creation failed");

    // =========================================================================
    // RETRY METRICS
    // =========================================================================

    /// Retry attempts made by the backoff helper
    pub static ref RETRY_ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("pk_retry_attempts_total", "Attempts made by the backoff helper"),
        &["outcome"]  // outcome: success/retry/gave_up/exhausted
    ).expect("metric creation failed");

    // =========================================================================
    // OBSERVER REGISTRY METRICS
    // =========================================================================

    /// Broadcast notifications dispatched
    pub static ref OBSERVER_NOTIFICATIONS: Counter = Counter::new(
        "pk_observer_notifications_total",
        "Broadcast events dispatched through the observer registry"
    ).expect("metric creation failed");

    /// Observer evictions by cause
    pub static ref OBSERVER_EVICTIONS: CounterVec = CounterVec::new(
        Opts::new("pk_observer_evictions_total", "Observers evicted from the registry"),
        &["cause"]  // cause: stale/faulted/dropped
    ).expect("metric creation failed");
}

/// Handle proving the metrics were registered.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the crate-local registry.
///
/// # Errors
///
/// `TelemetryError::MetricsInit` if any metric is already registered.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Connection
        Box::new(CONNECTION_ATTEMPTS.clone()),
        Box::new(OPERATIONS.clone()),
        Box::new(STALE_COMPLETIONS.clone()),
        // Verification
        Box::new(SIGNATURE_VERIFICATIONS.clone()),
        Box::new(VERIFICATION_DURATION.clone()),
        Box::new(PURCHASE_HIJACKS.clone()),
        // Retry
        Box::new(RETRY_ATTEMPTS.clone()),
        // Observer registry
        Box::new(OBSERVER_NOTIFICATIONS.clone()),
        Box::new(OBSERVER_EVICTIONS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
