//! Batch inference over unlabeled comments

use crate::config::InferenceConfig;
use crate::dataset::CommentDataset;
use crate::loader::{load_bert_config, resolve_pretrained, PretrainedFiles};
use crate::model::ToxicityModel;
use crate::params::ParameterStore;
use crate::tokenizer::TextEncoder;
use candle_core::Device;
use serde::Serialize;
use std::path::Path;
use toxguard_core::{Error, Prediction, Result, SubtypeLabel};
use tracing::{debug, info};

/// Trained classifier ready to score text
pub struct InferenceRunner {
    encoder: TextEncoder,
    model: ToxicityModel,
    device: Device,
    batch_size: usize,
}

/// One scored input row
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredComment {
    pub comment_text: String,
    pub prediction: Prediction,
}

impl InferenceRunner {
    /// Resolve the encoder config and tokenizer, then load the trained weights
    pub fn load(config: &InferenceConfig) -> Result<Self> {
        let files = resolve_pretrained(&config.pretrained, false)?;
        let device = config.device.to_device()?;
        Self::from_files(
            &files,
            &config.weights,
            config.batch_size,
            config.max_length,
            device,
        )
    }

    pub fn from_files(
        files: &PretrainedFiles,
        weights: &Path,
        batch_size: usize,
        max_length: usize,
        device: Device,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        let bert_config = load_bert_config(&files.config)?;
        let encoder = TextEncoder::from_file(&files.tokenizer, max_length)?;
        let params = ParameterStore::trained(weights, &device)?;
        let model = ToxicityModel::load(params.encoder_vb(), params.head_vb(), &bert_config)?;

        info!("Loaded classifier from {} on {:?}", weights.display(), device);
        Ok(Self {
            encoder,
            model,
            device,
            batch_size,
        })
    }

    /// Score a slice of texts as a single batch
    pub fn predict_texts(&self, texts: &[&str]) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let encoded = self.encoder.encode_batch(texts)?;
        let (input_ids, token_type_ids, attention_mask) = encoded.to_tensors(&self.device)?;
        self.model
            .forward(&input_ids, &token_type_ids, &attention_mask)?
            .predictions()
    }

    /// Score one text
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        self.predict_texts(&[text])?
            .pop()
            .ok_or_else(|| Error::internal("Model returned no prediction"))
    }

    /// Score every comment in fixed-size batches, preserving input order
    pub fn run(&self, dataset: &CommentDataset) -> Result<Vec<ScoredComment>> {
        let mut results = Vec::with_capacity(dataset.len());
        let total_batches = dataset.len().div_ceil(self.batch_size);

        for (index, chunk) in dataset.texts().chunks(self.batch_size).enumerate() {
            let texts: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let predictions = self.predict_texts(&texts)?;
            results.extend(
                chunk
                    .iter()
                    .zip(predictions)
                    .map(|(text, prediction)| ScoredComment {
                        comment_text: text.clone(),
                        prediction,
                    }),
            );
            debug!("Scored batch {}/{}", index + 1, total_batches);
        }

        info!("Scored {} comments", results.len());
        Ok(results)
    }
}

#[derive(Serialize)]
struct ResultRow<'a> {
    comment_text: &'a str,
    toxicity_score: f32,
    severe_toxicity: f32,
    obscene: f32,
    identity_attack: f32,
    insult: f32,
    threat: f32,
    sexual_explicit: f32,
    toxicity_label: &'static str,
    subtypes: String,
}

impl<'a> ResultRow<'a> {
    fn from_scored(scored: &'a ScoredComment) -> Result<Self> {
        let p = &scored.prediction;
        let triggered: Vec<&str> = p
            .triggered_subtypes()
            .iter()
            .map(SubtypeLabel::as_str)
            .collect();

        Ok(Self {
            comment_text: &scored.comment_text,
            toxicity_score: p.toxicity,
            severe_toxicity: p.subtype(SubtypeLabel::SevereToxicity),
            obscene: p.subtype(SubtypeLabel::Obscene),
            identity_attack: p.subtype(SubtypeLabel::IdentityAttack),
            insult: p.subtype(SubtypeLabel::Insult),
            threat: p.subtype(SubtypeLabel::Threat),
            sexual_explicit: p.subtype(SubtypeLabel::SexualExplicit),
            toxicity_label: p.label().as_str(),
            subtypes: serde_json::to_string(&triggered)?,
        })
    }
}

/// Write the results table, one row per scored comment
pub fn write_results(path: impl AsRef<Path>, results: &[ScoredComment]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for scored in results {
        writer.serialize(ResultRow::from_scored(scored)?)?;
    }
    writer.flush()?;

    info!("Wrote {} results to {}", results.len(), path.display());
    Ok(())
}
