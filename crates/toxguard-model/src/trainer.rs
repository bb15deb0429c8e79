//! Training loop
//!
//! Each epoch walks the dataset in shuffled mini-batches. A step encodes the
//! batch, runs the model, sums the binary cross-entropy of both heads and
//! applies one AdamW update. Loss and toxicity-head accuracy accumulate per
//! epoch and are reported to the experiment tracker. Weights are written per
//! the configured [`CheckpointPolicy`].

use crate::candle_err;
use crate::config::{CheckpointPolicy, TrainingConfig};
use crate::dataset::{ToxicityDataset, TrainingBatch};
use crate::loader::{load_bert_config, resolve_pretrained, PretrainedFiles};
use crate::model::ToxicityModel;
use crate::params::ParameterStore;
use crate::tokenizer::TextEncoder;
use candle_core::backprop::GradStore;
use candle_core::{Device, Tensor};
use candle_nn::loss::binary_cross_entropy_with_logit;
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use toxguard_core::{binarize, Error, Result, NUM_SUBTYPES};
use toxguard_telemetry::{ExperimentTracker, RunStatus};
use tracing::{debug, info, warn};

/// Artifact name under which the weight file is tracked
pub const WEIGHTS_ARTIFACT: &str = "Toxicity";

/// Aggregates for one epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    /// 1-based
    pub epoch: usize,

    /// Mean of the per-batch combined loss
    pub avg_loss: f64,

    /// Toxicity-head accuracy in percent
    pub accuracy: f64,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs: Vec<EpochStats>,
    pub weights_path: PathBuf,
    pub training_time: Duration,
    pub run_id: String,
}

impl TrainingSummary {
    pub fn final_epoch(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }
}

/// Fine-tunes a [`ToxicityModel`] on a labeled dataset
pub struct Trainer {
    config: TrainingConfig,
    output_dir: PathBuf,
    device: Device,
    encoder: TextEncoder,
    params: ParameterStore,
    model: ToxicityModel,
}

impl Trainer {
    /// Resolve the pretrained encoder named in `config` and build the model
    pub fn new(config: TrainingConfig, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let files = resolve_pretrained(&config.pretrained, true)?;
        Self::from_files(config, &files, output_dir)
    }

    /// Build the model from already resolved pretrained files
    pub fn from_files(
        config: TrainingConfig,
        files: &PretrainedFiles,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        let device = config.device.to_device()?;
        info!("Training on {:?}", device);

        let bert_config = load_bert_config(&files.config)?;
        let encoder = TextEncoder::from_file(&files.tokenizer, config.max_length)?;
        let params = ParameterStore::pretrained(files.weights()?, &device, config.fine_tune_encoder)?;
        let model = ToxicityModel::load(params.encoder_vb(), params.head_vb(), &bert_config)?;

        Ok(Self {
            config,
            output_dir: output_dir.into(),
            device,
            encoder,
            params,
            model,
        })
    }

    /// Where the weight file is written
    pub fn weights_path(&self) -> PathBuf {
        self.output_dir.join(&self.config.weights_file)
    }

    /// Train for the configured number of epochs, closing the tracker run
    pub fn run(
        &mut self,
        dataset: &ToxicityDataset,
        tracker: &mut dyn ExperimentTracker,
    ) -> Result<TrainingSummary> {
        match self.run_epochs(dataset, tracker) {
            Ok(summary) => {
                tracker.finish(RunStatus::Finished)?;
                Ok(summary)
            }
            Err(e) => {
                if let Err(finish_err) = tracker.finish(RunStatus::Failed) {
                    warn!("Failed to close tracker run: {}", finish_err);
                }
                Err(e)
            }
        }
    }

    fn run_epochs(
        &mut self,
        dataset: &ToxicityDataset,
        tracker: &mut dyn ExperimentTracker,
    ) -> Result<TrainingSummary> {
        if dataset.is_empty() {
            return Err(Error::data("Training dataset is empty"));
        }

        tracker.log_param("batch_size", &self.config.batch_size.to_string())?;
        tracker.log_param("epochs", &self.config.epochs.to_string())?;
        tracker.log_param("learning_rate", &self.config.learning_rate.to_string())?;

        let vars = self.params.trainable_vars();
        info!(
            "Starting training: {} samples, {} epochs, batch size {}, {} trainable tensors (encoder {})",
            dataset.len(),
            self.config.epochs,
            self.config.batch_size,
            vars.len(),
            if self.params.fine_tunes_encoder() {
                "fine-tuned"
            } else {
                "frozen"
            }
        );

        let mut optimizer = AdamW::new(
            vars,
            ParamsAdamW {
                lr: self.config.learning_rate,
                ..Default::default()
            },
        )
        .map_err(candle_err("Failed to create optimizer"))?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let weights_path = self.weights_path();
        let start = Instant::now();
        let mut epochs = Vec::with_capacity(self.config.epochs);

        for epoch in 1..=self.config.epochs {
            let stats = self.train_epoch(epoch, dataset, &mut optimizer, &mut rng)?;
            info!(
                "Epoch {} | Accuracy: {:.2}% | Loss: {:.4}",
                stats.epoch, stats.accuracy, stats.avg_loss
            );
            tracker.log_metric("train_loss", stats.avg_loss, Some(epoch as u64))?;
            tracker.log_metric("train_accuracy", stats.accuracy, Some(epoch as u64))?;

            if self.config.checkpoint == CheckpointPolicy::EveryEpoch {
                self.params.save(&weights_path)?;
                info!("Checkpoint written to {}", weights_path.display());
            }
            epochs.push(stats);
        }

        if self.config.checkpoint == CheckpointPolicy::EndOfRun {
            self.params.save(&weights_path)?;
            info!("Weights written to {}", weights_path.display());
        }

        let training_time = start.elapsed();
        tracker.log_metric("training_time_sec", training_time.as_secs_f64(), None)?;
        tracker.log_artifact(WEIGHTS_ARTIFACT, &weights_path)?;

        Ok(TrainingSummary {
            epochs,
            weights_path,
            training_time,
            run_id: tracker.run_id().to_string(),
        })
    }

    fn train_epoch(
        &self,
        epoch: usize,
        dataset: &ToxicityDataset,
        optimizer: &mut AdamW,
        rng: &mut StdRng,
    ) -> Result<EpochStats> {
        let mut total_loss = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;
        let mut steps = 0usize;

        for batch in dataset.batches(self.config.batch_size, Some(rng)) {
            let verify_gradients = epoch == 1 && steps == 0;
            let (loss, batch_correct) = self.train_step(&batch, optimizer, verify_gradients)?;
            total_loss += loss;
            correct += batch_correct;
            seen += batch.len();
            steps += 1;

            if self.config.log_every > 0 && steps % self.config.log_every == 0 {
                debug!(
                    epoch,
                    step = steps,
                    loss = total_loss / steps as f64,
                    accuracy = 100.0 * correct as f64 / seen as f64,
                    "training progress"
                );
            }
        }

        Ok(EpochStats {
            epoch,
            avg_loss: total_loss / steps.max(1) as f64,
            accuracy: 100.0 * correct as f64 / seen.max(1) as f64,
        })
    }

    /// One optimizer step; returns the batch loss and correct toxicity predictions
    fn train_step(
        &self,
        batch: &TrainingBatch<'_>,
        optimizer: &mut AdamW,
        verify_gradients: bool,
    ) -> Result<(f64, usize)> {
        let encoded = self.encoder.encode_batch(&batch.texts)?;
        let (input_ids, token_type_ids, attention_mask) = encoded.to_tensors(&self.device)?;
        let output = self
            .model
            .forward(&input_ids, &token_type_ids, &attention_mask)?;

        let toxicity = Tensor::from_slice(&batch.toxicity, batch.len(), &self.device)
            .map_err(candle_err("Failed to create toxicity targets"))?;
        let subtypes = Tensor::from_slice(&batch.subtypes, (batch.len(), NUM_SUBTYPES), &self.device)
            .map_err(candle_err("Failed to create subtype targets"))?;

        let loss = binary_cross_entropy_with_logit(&output.toxicity_logits, &toxicity)
            .and_then(|tox_loss| {
                let subtype_loss =
                    binary_cross_entropy_with_logit(&output.subtype_logits, &subtypes)?;
                tox_loss + subtype_loss
            })
            .map_err(candle_err("Loss computation failed"))?;

        let grads = loss.backward().map_err(candle_err("Backward pass failed"))?;
        if verify_gradients {
            self.check_encoder_gradients(&grads)?;
        }
        optimizer
            .step(&grads)
            .map_err(candle_err("Optimizer step failed"))?;

        let loss_value = loss
            .to_scalar::<f32>()
            .map_err(candle_err("Failed to read loss"))?;
        let probabilities = output
            .toxicity_probabilities()?
            .to_vec1::<f32>()
            .map_err(candle_err("Failed to read probabilities"))?;
        let correct = probabilities
            .iter()
            .zip(&batch.toxicity)
            .filter(|(p, t)| binarize(**p) == binarize(**t))
            .count();

        Ok((loss_value as f64, correct))
    }

    /// Fail when a fine-tuned encoder tensor is cut off from the loss
    fn check_encoder_gradients(&self, grads: &GradStore) -> Result<()> {
        let vars = self.params.encoder_vars()?;
        let missing: Vec<&str> = vars
            .iter()
            .filter(|(_, var)| grads.get(var.as_tensor()).is_none())
            .map(|(name, _)| name.as_str())
            .collect();

        if let Some(first) = missing.first() {
            return Err(Error::model(format!(
                "{} of {} encoder tensors received no gradient (first: {})",
                missing.len(),
                vars.len(),
                first
            )));
        }
        debug!("All {} encoder tensors receive gradients", vars.len());
        Ok(())
    }

    /// Output directory for the weight file
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
