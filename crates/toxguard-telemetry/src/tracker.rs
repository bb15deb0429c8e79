//! Experiment tracking for training runs
//!
//! Each run lives in its own directory under `<root>/<experiment>/<run_id>/`:
//! - `meta.json` run identity, status and wall-clock bounds
//! - `params.json` hyperparameters, rewritten on every update
//! - `metrics.jsonl` append-only metric records
//! - `artifacts/<name>/` copies of logged files

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use toxguard_core::Result;
use tracing::{debug, info};

/// Sink for run parameters, metrics and artifacts
pub trait ExperimentTracker: Send {
    /// Identifier of the active run
    fn run_id(&self) -> &str;

    /// Record a hyperparameter
    fn log_param(&mut self, key: &str, value: &str) -> Result<()>;

    /// Record a metric value, optionally tagged with a step (epoch, batch)
    fn log_metric(&mut self, key: &str, value: f64, step: Option<u64>) -> Result<()>;

    /// Attach a file produced by the run
    fn log_artifact(&mut self, name: &str, path: &Path) -> Result<()>;

    /// Close the run
    fn finish(&mut self, status: RunStatus) -> Result<()>;
}

/// Terminal or in-flight state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// One line of `metrics.jsonl`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub key: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunMeta {
    run_id: String,
    experiment: String,
    status: RunStatus,
    start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
}

/// Tracker that persists runs to the local filesystem
pub struct FileTracker {
    run_dir: PathBuf,
    meta: RunMeta,
    params: BTreeMap<String, String>,
    metrics: BufWriter<File>,
}

impl FileTracker {
    /// Start a new run for `experiment` under `root`
    pub fn start(root: impl AsRef<Path>, experiment: &str) -> Result<Self> {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let run_dir = root.as_ref().join(experiment).join(&run_id);
        std::fs::create_dir_all(&run_dir)?;

        let metrics_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(run_dir.join("metrics.jsonl"))?;

        let tracker = Self {
            meta: RunMeta {
                run_id,
                experiment: experiment.to_string(),
                status: RunStatus::Running,
                start_time: Utc::now(),
                end_time: None,
            },
            run_dir,
            params: BTreeMap::new(),
            metrics: BufWriter::new(metrics_file),
        };
        tracker.write_meta()?;

        info!(
            "Started run {} for experiment '{}' at {}",
            tracker.meta.run_id,
            experiment,
            tracker.run_dir.display()
        );
        Ok(tracker)
    }

    /// Directory holding this run's files
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Read back every metric record of a run directory
    pub fn read_metrics(run_dir: impl AsRef<Path>) -> Result<Vec<MetricRecord>> {
        let file = File::open(run_dir.as_ref().join("metrics.jsonl"))?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    /// Read back the parameters of a run directory
    pub fn read_params(run_dir: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
        let content = std::fs::read_to_string(run_dir.as_ref().join("params.json"))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_meta(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.meta)?;
        std::fs::write(self.run_dir.join("meta.json"), content)?;
        Ok(())
    }
}

impl ExperimentTracker for FileTracker {
    fn run_id(&self) -> &str {
        &self.meta.run_id
    }

    fn log_param(&mut self, key: &str, value: &str) -> Result<()> {
        self.params.insert(key.to_string(), value.to_string());
        let content = serde_json::to_string_pretty(&self.params)?;
        std::fs::write(self.run_dir.join("params.json"), content)?;
        Ok(())
    }

    fn log_metric(&mut self, key: &str, value: f64, step: Option<u64>) -> Result<()> {
        let record = MetricRecord {
            key: key.to_string(),
            value,
            step,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&record)?;
        writeln!(self.metrics, "{}", json)?;
        self.metrics.flush()?;
        debug!("Logged metric {}={} (step {:?})", key, value, step);
        Ok(())
    }

    fn log_artifact(&mut self, name: &str, path: &Path) -> Result<()> {
        let dest_dir = self.run_dir.join("artifacts").join(name);
        std::fs::create_dir_all(&dest_dir)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| toxguard_core::Error::config(format!("Not a file: {}", path.display())))?;
        std::fs::copy(path, dest_dir.join(file_name))?;

        info!("Logged artifact '{}' from {}", name, path.display());
        Ok(())
    }

    fn finish(&mut self, status: RunStatus) -> Result<()> {
        self.metrics.flush()?;
        self.meta.status = status;
        self.meta.end_time = Some(Utc::now());
        self.write_meta()?;
        info!("Run {} finished with status {:?}", self.meta.run_id, status);
        Ok(())
    }
}

/// Tracker that discards everything
#[derive(Debug, Default)]
pub struct NoopTracker;

impl ExperimentTracker for NoopTracker {
    fn run_id(&self) -> &str {
        "noop"
    }

    fn log_param(&mut self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn log_metric(&mut self, _key: &str, _value: f64, _step: Option<u64>) -> Result<()> {
        Ok(())
    }

    fn log_artifact(&mut self, _name: &str, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self, _status: RunStatus) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_tracker_records_run() {
        let root = TempDir::new().unwrap();
        let mut tracker = FileTracker::start(root.path(), "toxicity_classification").unwrap();

        tracker.log_param("batch_size", "32").unwrap();
        tracker.log_param("epochs", "1").unwrap();
        tracker.log_metric("train_loss", 0.42, Some(1)).unwrap();
        tracker.log_metric("training_time_sec", 3.5, None).unwrap();

        let weights = root.path().join("toxicity.safetensors");
        std::fs::write(&weights, b"weights").unwrap();
        tracker.log_artifact("Toxicity", &weights).unwrap();
        tracker.finish(RunStatus::Finished).unwrap();

        let run_dir = tracker.run_dir().to_path_buf();
        assert!(run_dir.starts_with(root.path().join("toxicity_classification")));

        let params = FileTracker::read_params(&run_dir).unwrap();
        assert_eq!(params.get("batch_size").map(String::as_str), Some("32"));
        assert_eq!(params.len(), 2);

        let metrics = FileTracker::read_metrics(&run_dir).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].key, "train_loss");
        assert_eq!(metrics[0].step, Some(1));
        assert_eq!(metrics[1].step, None);

        assert!(run_dir
            .join("artifacts/Toxicity/toxicity.safetensors")
            .exists());

        let meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(run_dir.join("meta.json")).unwrap())
                .unwrap();
        assert_eq!(meta["status"], "finished");
        assert!(meta["end_time"].is_string());
    }

    #[test]
    fn test_runs_get_distinct_directories() {
        let root = TempDir::new().unwrap();
        let a = FileTracker::start(root.path(), "exp").unwrap();
        let b = FileTracker::start(root.path(), "exp").unwrap();
        assert_ne!(a.run_id(), b.run_id());
        assert_ne!(a.run_dir(), b.run_dir());
    }

    #[test]
    fn test_noop_tracker_accepts_everything() {
        let mut tracker = NoopTracker;
        tracker.log_param("k", "v").unwrap();
        tracker.log_metric("m", 1.0, None).unwrap();
        tracker
            .log_artifact("a", Path::new("/nonexistent/file"))
            .unwrap();
        tracker.finish(RunStatus::Failed).unwrap();
    }
}
