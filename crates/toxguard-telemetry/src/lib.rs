//! ToxGuard Telemetry
//!
//! Experiment tracking and metrics for ToxGuard.
//!
//! Provides:
//! - A file-backed experiment tracker recording run parameters, metrics and artifacts
//! - Prometheus metric registration and recording helpers for the serving layer

pub mod metrics;
pub mod tracker;

pub use tracker::{ExperimentTracker, FileTracker, MetricRecord, NoopTracker, RunStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::tracker::{ExperimentTracker, FileTracker, NoopTracker, RunStatus};
}
