//! Configuration for training and inference runs

use candle_core::Device;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toxguard_core::{Error, Result};

/// Where the pretrained encoder (config, tokenizer, weights) comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PretrainedSource {
    /// Local directory containing `config.json`, `tokenizer.json`, `model.safetensors`
    Local { path: PathBuf },

    /// Hugging Face Hub repository
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
    },
}

impl Default for PretrainedSource {
    fn default() -> Self {
        Self::HuggingFace {
            repo_id: "bert-base-uncased".to_string(),
            revision: None,
        }
    }
}

impl FromStr for PretrainedSource {
    type Err = String;

    /// Existing directories are local sources, anything else is a hub repo id
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("pretrained source must not be empty".to_string());
        }
        let path = Path::new(s);
        if path.is_dir() {
            Ok(Self::Local {
                path: path.to_path_buf(),
            })
        } else {
            Ok(Self::HuggingFace {
                repo_id: s.to_string(),
                revision: None,
            })
        }
    }
}

/// Device specification (for config files and CLI flags)
///
/// Serialized as the same string the CLI accepts: `auto`, `cpu`, `cuda`,
/// `cuda:N`, `metal` or `metal:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSpec {
    /// First CUDA device when available, CPU otherwise
    #[default]
    Auto,
    Cpu,
    Cuda { index: Option<usize> },
    Metal { index: Option<usize> },
}

impl DeviceSpec {
    /// Create the Candle device
    pub fn to_device(&self) -> Result<Device> {
        match self {
            DeviceSpec::Auto => Device::cuda_if_available(0)
                .map_err(|e| Error::config(format!("Failed to probe CUDA device: {}", e))),
            DeviceSpec::Cpu => Ok(Device::Cpu),
            DeviceSpec::Cuda { index } => Device::new_cuda(index.unwrap_or(0))
                .map_err(|e| Error::config(format!("Failed to create CUDA device: {}", e))),
            DeviceSpec::Metal { index } => Device::new_metal(index.unwrap_or(0))
                .map_err(|e| Error::config(format!("Failed to create Metal device: {}", e))),
        }
    }
}

impl FromStr for DeviceSpec {
    type Err = String;

    /// Accepts `auto`, `cpu`, `cuda`, `cuda:N`, `metal`, `metal:N`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, index) = match s.split_once(':') {
            Some((kind, index)) => {
                let index = index
                    .parse::<usize>()
                    .map_err(|_| format!("invalid device index in '{}'", s))?;
                (kind, Some(index))
            }
            None => (s, None),
        };

        match (kind.to_ascii_lowercase().as_str(), index) {
            ("auto", None) => Ok(Self::Auto),
            ("cpu", None) => Ok(Self::Cpu),
            ("cuda", index) => Ok(Self::Cuda { index }),
            ("metal", index) => Ok(Self::Metal { index }),
            _ => Err(format!(
                "unknown device '{}' (expected auto, cpu, cuda[:N] or metal[:N])",
                s
            )),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSpec::Auto => f.write_str("auto"),
            DeviceSpec::Cpu => f.write_str("cpu"),
            DeviceSpec::Cuda { index: None } => f.write_str("cuda"),
            DeviceSpec::Cuda { index: Some(i) } => write!(f, "cuda:{}", i),
            DeviceSpec::Metal { index: None } => f.write_str("metal"),
            DeviceSpec::Metal { index: Some(i) } => write!(f, "metal:{}", i),
        }
    }
}

impl TryFrom<String> for DeviceSpec {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeviceSpec> for String {
    fn from(device: DeviceSpec) -> Self {
        device.to_string()
    }
}

/// When the trainer writes the weight file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointPolicy {
    /// Overwrite the weight file after every epoch
    #[default]
    EveryEpoch,
    /// Write the weight file once, after the last epoch
    EndOfRun,
}

/// Experiment tracking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_experiment")]
    pub experiment: String,

    /// Root directory for run records
    #[serde(default = "default_runs_dir")]
    pub dir: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            experiment: default_experiment(),
            dir: default_runs_dir(),
        }
    }
}

/// Training run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Pretrained encoder to fine-tune
    #[serde(default)]
    pub pretrained: PretrainedSource,

    /// Fixed token sequence length
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Read at most this many rows from the training CSV
    #[serde(default)]
    pub max_rows: Option<usize>,

    /// Shuffle seed; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub checkpoint: CheckpointPolicy,

    #[serde(default)]
    pub device: DeviceSpec,

    /// Update encoder weights as well as the heads
    #[serde(default = "default_true")]
    pub fine_tune_encoder: bool,

    /// Weight file name, relative to the output directory
    #[serde(default = "default_weights_file")]
    pub weights_file: String,

    /// Emit a progress event every N steps
    #[serde(default = "default_log_every")]
    pub log_every: usize,

    #[serde(default)]
    pub tracking: TrackingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            pretrained: PretrainedSource::default(),
            max_length: default_max_length(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            max_rows: None,
            seed: None,
            checkpoint: CheckpointPolicy::default(),
            device: DeviceSpec::default(),
            fine_tune_encoder: true,
            weights_file: default_weights_file(),
            log_every: default_log_every(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid training config: {}", e)))
    }

    /// Load from file, or use defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        Ok(config)
    }

    /// Reject values the training loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(Error::config("epochs must be at least 1"));
        }
        if self.max_length < 2 {
            return Err(Error::config("max_length must leave room for special tokens"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::config("learning_rate must be positive"));
        }
        if self.weights_file.trim().is_empty() {
            return Err(Error::config("weights_file must not be empty"));
        }
        Ok(())
    }
}

/// Inference run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Encoder whose config and tokenizer match the trained weights
    #[serde(default)]
    pub pretrained: PretrainedSource,

    /// Weight file written by training
    #[serde(default = "default_weights_path")]
    pub weights: PathBuf,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default)]
    pub device: DeviceSpec,

    /// Results table path
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            pretrained: PretrainedSource::default(),
            weights: default_weights_path(),
            batch_size: default_batch_size(),
            max_length: default_max_length(),
            device: DeviceSpec::default(),
            output: default_output(),
        }
    }
}

impl InferenceConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid inference config: {}", e)))
    }
}

fn default_max_length() -> usize {
    128
}

fn default_batch_size() -> usize {
    32
}

fn default_learning_rate() -> f64 {
    2e-5
}

fn default_epochs() -> usize {
    3
}

fn default_weights_file() -> String {
    "toxicity.safetensors".to_string()
}

fn default_weights_path() -> PathBuf {
    PathBuf::from(default_weights_file())
}

fn default_output() -> PathBuf {
    PathBuf::from("inference_results.csv")
}

fn default_log_every() -> usize {
    50
}

fn default_experiment() -> String {
    "toxicity_classification".to_string()
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("./mlruns")
}

fn default_true() -> bool {
    true
}
