//! Observability infrastructure for the prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction/error counters, slow
//!   inferences, model state)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, GaugeVec,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    batch_items_failed_total: IntCounter,
    slow_inferences_total: IntCounter,
    model_loaded: IntGauge,
    model_version_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "traffic_predictor_prediction_latency_seconds",
                "Time spent deriving features, scoring and classifying one prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "traffic_predictor_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "traffic_predictor_prediction_errors_total",
                "Total number of failed predictions"
            )
            .expect("Failed to register prediction_errors_total"),

            batch_items_failed_total: register_int_counter!(
                "traffic_predictor_batch_items_failed_total",
                "Total number of batch items reported as errors"
            )
            .expect("Failed to register batch_items_failed_total"),

            slow_inferences_total: register_int_counter!(
                "traffic_predictor_slow_inferences_total",
                "Total number of model runs slower than the inference latency target"
            )
            .expect("Failed to register slow_inferences_total"),

            model_loaded: register_int_gauge!(
                "traffic_predictor_model_loaded",
                "1 when a scoring artifact is loaded, 0 otherwise"
            )
            .expect("Failed to register model_loaded"),

            model_version_info: register_gauge_vec!(
                "traffic_predictor_model_version_info",
                "Information about the currently loaded scoring artifact",
                &["version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance.
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

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn add_batch_failures(&self, count: u64) {
        self.inner().batch_items_failed_total.inc_by(count);
    }

    pub fn inc_slow_inferences(&self) {
        self.inner().slow_inferences_total.inc();
    }

    /// Record the artifact state; `None` means no model is loaded
    pub fn set_model(&self, version: Option<&str>) {
        let inner = self.inner();
        inner.model_version_info.reset();
        match version {
            Some(version) => {
                inner.model_loaded.set(1);
                inner.model_version_info.with_label_values(&[version]).set(1.0);
            }
            None => inner.model_loaded.set(0),
        }
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for predictions,
/// batches, sweeps and lifecycle events.
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

    pub fn log_prediction(
        &self,
        route_id: &str,
        hour: u8,
        day_of_week: u8,
        congestion_index: f64,
        congestion_level: &str,
        elapsed_us: u128,
    ) {
        debug!(
            event = "prediction_generated",
            service = %self.service,
            route_id = %route_id,
            hour = hour,
            day_of_week = day_of_week,
            congestion_index = congestion_index,
            congestion_level = %congestion_level,
            elapsed_us = elapsed_us as u64,
            "Generated congestion prediction"
        );
    }

    pub fn log_prediction_failure(&self, route_id: &str, hour: Option<u8>, error: &str, client_error: bool) {
        if client_error {
            warn!(
                event = "prediction_failed",
                service = %self.service,
                route_id = %route_id,
                hour = ?hour,
                error = %error,
                "Prediction rejected"
            );
        } else {
            error!(
                event = "prediction_failed",
                service = %self.service,
                route_id = %route_id,
                hour = ?hour,
                error = %error,
                "Prediction failed"
            );
        }
    }

    pub fn log_batch(&self, count: usize, failed: usize) {
        if failed > 0 {
            warn!(
                event = "batch_completed",
                service = %self.service,
                count = count,
                failed = failed,
                "Batch completed with failed items"
            );
        } else {
            info!(
                event = "batch_completed",
                service = %self.service,
                count = count,
                failed = 0,
                "Batch completed"
            );
        }
    }

    pub fn log_hourly_sweep(&self, route_id: &str, day_of_week: u8, vehicle_count: u32) {
        info!(
            event = "hourly_sweep_completed",
            service = %self.service,
            route_id = %route_id,
            day_of_week = day_of_week,
            vehicle_count = vehicle_count,
            "Hourly sweep completed"
        );
    }

    pub fn log_model_state(&self, model_path: &str, version: Option<&str>) {
        match version {
            Some(version) => info!(
                event = "model_loaded",
                service = %self.service,
                model_path = %model_path,
                version = %version,
                "Scoring artifact ready"
            ),
            None => warn!(
                event = "model_unavailable",
                service = %self.service,
                model_path = %model_path,
                "No scoring artifact loaded, predictions will fail until one is deployed"
            ),
        }
    }

    pub fn log_startup(&self, version: &str, addr: &str, debug_enabled: bool) {
        info!(
            event = "service_started",
            service = %self.service,
            service_version = %version,
            addr = %addr,
            debug = debug_enabled,
            "Traffic prediction service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Traffic prediction service shutting down"
        );
    }
}
