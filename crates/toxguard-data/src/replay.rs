//! Replay of production comments against a scoring endpoint
//!
//! Rows are read from a CSV and, one at a time, either printed as the JSON
//! payload that would be sent (dry run) or posted to the endpoint. A random
//! pause separates consecutive rows to mimic organic traffic. Each request
//! attempt yields a `Result<StatusCode, ReplayError>`; the [`RetryPolicy`]
//! decides whether to try again and every row ends up counted in the
//! [`ReplayReport`].

use crate::records::read_csv;
use rand::Rng;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use toxguard_core::{Error, Result};
use tracing::{debug, info, warn};

/// Replay run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Print payloads instead of sending them
    #[serde(default = "default_true")]
    pub dry_run: bool,

    #[serde(default = "default_min_delay")]
    pub min_delay_secs: f64,

    #[serde(default = "default_max_delay")]
    pub max_delay_secs: f64,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            endpoint: default_endpoint(),
            dry_run: true,
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
            timeout_secs: default_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ReplayConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("Invalid replay config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        for delay in [self.min_delay_secs, self.max_delay_secs] {
            if !(delay.is_finite() && delay >= 0.0) {
                return Err(Error::config("delays must be finite and non-negative"));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts must be at least 1"));
        }
        if !self.dry_run && self.endpoint.trim().is_empty() {
            return Err(Error::config("endpoint must be set when sending"));
        }
        Ok(())
    }

    /// Pause before the next row, uniform in `[min_delay, max_delay]`
    pub fn sample_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let secs = if self.max_delay_secs > self.min_delay_secs {
            rng.gen_range(self.min_delay_secs..=self.max_delay_secs)
        } else {
            self.min_delay_secs
        };
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Retry rules for a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per row; 1 disables retries
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait before attempt `n + 1` is `n * backoff_ms`
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Transport failures and 5xx responses are retryable
    pub fn is_retryable(outcome: &std::result::Result<StatusCode, ReplayError>) -> bool {
        match outcome {
            Ok(status) => status.is_server_error(),
            Err(ReplayError::Transport(_)) => true,
        }
    }

    /// Pause after the given 1-based failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(attempt as u64))
    }
}

/// Failure of one request attempt
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outcome counts of a replay run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReplayReport {
    /// Rows read from the CSV
    pub total: usize,
    /// Rows delivered with a 2xx response, or printed in dry-run mode
    pub sent: usize,
    /// Rows that exhausted their attempts or got a non-retryable error status
    pub failed: usize,
    /// Rows without usable text
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ReplayRow {
    #[serde(default)]
    comment_text: Option<String>,
    #[serde(default)]
    clean_text: Option<String>,
}

impl ReplayRow {
    fn into_text(self) -> Option<String> {
        self.comment_text
            .filter(|text| !text.is_empty())
            .or(self.clean_text)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    text: &'a str,
}

/// Streams a CSV of comments to a scoring endpoint
pub struct ReplayClient {
    config: ReplayConfig,
    http: reqwest::Client,
}

impl ReplayClient {
    pub fn new(config: ReplayConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Replay every row, writing dry-run payload lines to `out`
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<ReplayReport> {
        info!("Reading production data from {}", self.config.data_path.display());
        let rows: Vec<ReplayRow> = read_csv(&self.config.data_path)?;
        let total = rows.len();
        info!("Total comments to stream: {}", total);

        let mut report = ReplayReport {
            total,
            ..Default::default()
        };
        let mut first = true;

        for (index, row) in rows.into_iter().enumerate() {
            let Some(text) = row.into_text() else {
                debug!("Skipping row {} without text", index + 1);
                report.skipped += 1;
                continue;
            };

            if !first {
                let delay = self.config.sample_delay(&mut rand::thread_rng());
                tokio::time::sleep(delay).await;
            }
            first = false;

            let payload = Payload { text: &text };
            if self.config.dry_run {
                writeln!(out, "[DRY RUN] Would send: {}", serde_json::to_string(&payload)?)?;
                report.sent += 1;
                continue;
            }

            match self.deliver(&payload).await {
                Ok(status) if status.is_success() => {
                    info!("Sent comment {}/{} - Status: {}", index + 1, total, status.as_u16());
                    report.sent += 1;
                }
                Ok(status) => {
                    warn!("Comment {}/{} rejected - Status: {}", index + 1, total, status.as_u16());
                    report.failed += 1;
                }
                Err(e) => {
                    warn!("Error sending comment {}: {}", index + 1, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Replay finished: {} sent, {} failed, {} skipped of {}",
            report.sent, report.failed, report.skipped, report.total
        );
        Ok(report)
    }

    /// Send one payload, retrying per the policy; returns the final outcome
    async fn deliver(&self, payload: &Payload<'_>) -> std::result::Result<StatusCode, ReplayError> {
        let policy = self.config.retry;
        let mut attempt = 1;
        loop {
            let outcome = self.send_once(payload).await;
            if attempt >= policy.max_attempts || !RetryPolicy::is_retryable(&outcome) {
                return outcome;
            }
            debug!("Attempt {} failed ({:?}), retrying", attempt, outcome);
            tokio::time::sleep(policy.backoff(attempt)).await;
            attempt += 1;
        }
    }

    async fn send_once(&self, payload: &Payload<'_>) -> std::result::Result<StatusCode, ReplayError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .json(payload)
            .send()
            .await?;
        Ok(response.status())
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("production.csv")
}

fn default_endpoint() -> String {
    "http://localhost:8000/predict".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    3.0
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff_ms() -> u64 {
    500
}
