//! Observability infrastructure for the demand prediction workflow
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction/error/fallback counts, model info)
//! - Structured logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, GaugeVec,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    fallbacks_total: IntCounter,
    model_loaded: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "demand_service_prediction_latency_seconds",
                "Time spent normalizing input and running inference",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "demand_service_predictions_total",
                "Total number of rows predicted"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "demand_service_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            fallbacks_total: register_int_counter!(
                "demand_service_fallbacks_total",
                "Total number of forecasts served by the fallback estimator"
            )
            .expect("Failed to register fallbacks_total"),

            model_loaded: register_int_gauge!(
                "demand_service_model_loaded",
                "Whether the model artifact loaded at startup (1) or not (0)"
            )
            .expect("Failed to register model_loaded"),

            model_info: register_gauge_vec!(
                "demand_service_model_info",
                "Information about the loaded model artifact",
                &["checksum", "kind"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, rows: u64) {
        self.inner().predictions_total.inc_by(rows);
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn inc_fallbacks(&self) {
        self.inner().fallbacks_total.inc();
    }

    /// Record the startup load outcome
    pub fn set_model_loaded(&self, checksum: Option<&str>, kind: Option<&str>) {
        let inner = self.inner();
        inner.model_info.reset();
        match (checksum, kind) {
            (Some(checksum), Some(kind)) => {
                inner.model_loaded.set(1);
                inner.model_info.with_label_values(&[checksum, kind]).set(1.0);
            }
            _ => inner.model_loaded.set(0),
        }
    }
}

/// Structured logger for workflow events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_path: &str, model_loaded: bool) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            model_path = %model_path,
            model_loaded = model_loaded,
            "Demand service started"
        );
    }

    pub fn log_model_unavailable(&self, model_path: &str, reason: &str) {
        error!(
            event = "model_load_failed",
            service = %self.service,
            model_path = %model_path,
            reason = %reason,
            "Failed to load model; inference disabled"
        );
    }

    pub fn log_prediction(&self, rows: usize, elapsed_us: u64) {
        info!(
            event = "prediction_served",
            service = %self.service,
            rows = rows,
            elapsed_us = elapsed_us,
            "Served predictions"
        );
    }

    pub fn log_prediction_failure(&self, status: u16, reason: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service,
            status = status,
            reason = %reason,
            "Prediction request failed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Demand service shutting down"
        );
    }
}

/// Install a JSON subscriber on stdout, filtered by `RUST_LOG` (default `info`)
pub fn init_json_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();
}

/// Install a plain subscriber on stderr, keeping stdout for command output
pub fn init_stderr_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
