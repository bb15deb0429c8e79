//! ToxGuard Model
//!
//! Toxicity classifier built on a pretrained BERT encoder, run with Candle.
//!
//! The pipeline is:
//! - [`tokenizer`] turns comments into fixed-length token-id and attention-mask batches
//! - [`dataset`] reads labeled or unlabeled comment CSVs
//! - [`encoder`] is the BERT encoder, differentiable end to end
//! - [`model`] adds a pooled representation and two sigmoid heads (toxicity, six subtypes)
//! - [`trainer`] fine-tunes with binary cross-entropy and AdamW, persisting one safetensors blob
//! - [`inference`] scores held-out comments and writes the results table
//! - [`scorer`] exposes single-comment scoring to the serving layer

pub mod config;
pub mod dataset;
pub mod encoder;
pub mod inference;
pub mod loader;
pub mod model;
pub mod params;
pub mod scorer;
pub mod tokenizer;
pub mod trainer;

pub use config::{
    CheckpointPolicy, DeviceSpec, InferenceConfig, PretrainedSource, TrackingConfig,
    TrainingConfig,
};
pub use dataset::{CommentDataset, ToxicityDataset, TrainingBatch};
pub use inference::{write_results, InferenceRunner, ScoredComment};
pub use loader::{load_bert_config, resolve_pretrained, PretrainedFiles};
pub use model::{ModelOutput, ToxicityModel};
pub use params::ParameterStore;
pub use scorer::{ModelScorer, ToxicityScorer};
pub use tokenizer::{EncodedBatch, TextEncoder};
pub use trainer::{EpochStats, Trainer, TrainingSummary};

/// Map a Candle error into a model error with context
pub(crate) fn candle_err(context: &'static str) -> impl Fn(candle_core::Error) -> toxguard_core::Error {
    move |e| toxguard_core::Error::model(format!("{}: {}", context, e))
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{InferenceConfig, TrainingConfig};
    pub use crate::inference::InferenceRunner;
    pub use crate::scorer::{ModelScorer, ToxicityScorer};
    pub use crate::trainer::Trainer;
}
