//! Prometheus metrics for the serving layer

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use toxguard_core::{Error, Result, ToxicityLabel};

pub const PREDICTIONS_TOTAL: &str = "toxguard_predictions_total";
pub const INFERENCE_LATENCY_US: &str = "toxguard_inference_latency_us";
pub const ERRORS_TOTAL: &str = "toxguard_errors_total";

/// Install the global Prometheus recorder and return a handle for rendering
pub fn init_prometheus() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install metrics recorder: {}", e)))?;

    describe();
    tracing::info!("Metrics exporter initialized");
    Ok(handle)
}

fn describe() {
    metrics::describe_counter!(PREDICTIONS_TOTAL, "Total number of comments scored by label");
    metrics::describe_histogram!(
        INFERENCE_LATENCY_US,
        metrics::Unit::Microseconds,
        "Tokenize plus forward pass latency in microseconds"
    );
    metrics::describe_counter!(ERRORS_TOTAL, "Total number of scoring errors by route");
}

/// Record one scored comment
pub fn record_prediction(label: ToxicityLabel, latency: Duration) {
    metrics::counter!(PREDICTIONS_TOTAL, "label" => label.as_str()).increment(1);
    metrics::histogram!(INFERENCE_LATENCY_US).record(latency.as_micros() as f64);
}

/// Record a scoring failure on the given route
pub fn record_error(route: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "route" => route).increment(1);
}
