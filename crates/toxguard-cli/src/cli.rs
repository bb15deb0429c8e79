use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use toxguard_data::{PreprocessConfig, ReplayConfig, SplitConfig};
use toxguard_model::{DeviceSpec, InferenceConfig, PretrainedSource, TrainingConfig};

#[derive(Parser, Debug)]
#[command(name = "toxguard")]
#[command(author, version, about = "Train, run and feed the ToxGuard toxicity classifier")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the classifier on a labeled comment CSV
    Train(TrainArgs),

    /// Score an unlabeled comment CSV with trained weights
    Infer(InferArgs),

    /// Filter positive rows and cut a chronological 90/10 split
    Preprocess(PreprocessArgs),

    /// Cut train, validation and production files from the raw corpus
    Split(SplitArgs),

    /// Stream production comments to a scoring endpoint
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labeled training CSV
    #[arg(short, long, visible_alias = "data_path", default_value = "train_clean.csv")]
    pub data_path: PathBuf,

    /// Directory for the weight file; created if absent
    #[arg(short, long, visible_alias = "output_dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// YAML training config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_parser = parse_pretrained)]
    pub pretrained: Option<PretrainedSource>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Read at most this many rows
    #[arg(long)]
    pub max_rows: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Device: auto, cpu, cuda[:N], metal[:N]
    #[arg(long, value_parser = parse_device)]
    pub device: Option<DeviceSpec>,

    /// Record params, metrics and the weight artifact under the runs directory
    #[arg(long)]
    pub track: bool,
}

impl TrainArgs {
    /// Load the config file (or defaults) and apply flag overrides
    pub fn resolve_config(&self) -> toxguard_core::Result<TrainingConfig> {
        let mut config = TrainingConfig::load(self.config.as_deref())?;
        if let Some(pretrained) = &self.pretrained {
            config.pretrained = pretrained.clone();
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if self.max_rows.is_some() {
            config.max_rows = self.max_rows;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if self.track {
            config.tracking.enabled = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct InferArgs {
    /// Comment CSV with a `comment_text` column
    #[arg(short, long, default_value = "test.csv")]
    pub data_path: PathBuf,

    /// Weight file written by training
    #[arg(short, long, default_value = "toxicity.safetensors")]
    pub weights: PathBuf,

    /// Results table
    #[arg(short, long, default_value = "inference_results.csv")]
    pub output: PathBuf,

    #[arg(long, default_value = "bert-base-uncased", value_parser = parse_pretrained)]
    pub pretrained: PretrainedSource,

    #[arg(long, default_value = "32")]
    pub batch_size: usize,

    #[arg(long, default_value = "128")]
    pub max_length: usize,

    #[arg(long, default_value = "auto", value_parser = parse_device)]
    pub device: DeviceSpec,
}

impl InferArgs {
    pub fn to_config(&self) -> InferenceConfig {
        InferenceConfig {
            pretrained: self.pretrained.clone(),
            weights: self.weights.clone(),
            batch_size: self.batch_size,
            max_length: self.max_length,
            device: self.device,
            output: self.output.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    #[arg(short, long, default_value = "train.csv")]
    pub input: PathBuf,

    #[arg(long, default_value = "training.csv")]
    pub train_out: PathBuf,

    #[arg(long, default_value = "validation.csv")]
    pub val_out: PathBuf,
}

impl PreprocessArgs {
    pub fn to_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            input: self.input.clone(),
            train_out: self.train_out.clone(),
            val_out: self.val_out.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    #[arg(short, long, default_value = "train.csv")]
    pub input: PathBuf,

    /// Directory receiving train.csv, val.csv and production.csv
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = "42")]
    pub seed: u64,
}

impl SplitArgs {
    pub fn to_config(&self) -> SplitConfig {
        SplitConfig {
            input: self.input.clone(),
            output_dir: self.output_dir.clone(),
            seed: self.seed,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// YAML replay config; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub data_path: Option<PathBuf>,

    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Post to the endpoint instead of printing payloads
    #[arg(long)]
    pub send: bool,

    #[arg(long)]
    pub min_delay: Option<f64>,

    #[arg(long)]
    pub max_delay: Option<f64>,

    /// Attempts per row, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ReplayArgs {
    pub fn resolve_config(&self) -> toxguard_core::Result<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::from_yaml(&std::fs::read_to_string(path)?)?,
            None => ReplayConfig::default(),
        };
        if let Some(data_path) = &self.data_path {
            config.data_path = data_path.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.send {
            config.dry_run = false;
        }
        if let Some(min_delay) = self.min_delay {
            config.min_delay_secs = min_delay;
        }
        if let Some(max_delay) = self.max_delay {
            config.max_delay_secs = max_delay;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_pretrained(s: &str) -> Result<PretrainedSource, String> {
    s.parse()
}

fn parse_device(s: &str) -> Result<DeviceSpec, String> {
    s.parse()
}
