use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use toxguard_model::ToxicityScorer;

/// Shared state of the form app
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<dyn ToxicityScorer>,

    /// Renders `/metrics`; absent when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(scorer: Arc<dyn ToxicityScorer>) -> Self {
        Self {
            scorer,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
