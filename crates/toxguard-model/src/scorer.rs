//! Single-comment scoring seam used by the serving layer

use crate::inference::InferenceRunner;
use async_trait::async_trait;
use std::time::Instant;
use toxguard_core::{Prediction, Result};
use tracing::debug;

/// Anything that can score one comment
#[async_trait]
pub trait ToxicityScorer: Send + Sync {
    /// Score the given text
    async fn score(&self, text: &str) -> Result<Prediction>;

    /// Get the scorer name
    fn name(&self) -> &str;
}

/// Scorer backed by the trained classifier
pub struct ModelScorer {
    name: String,
    runner: InferenceRunner,
}

impl ModelScorer {
    pub fn new(name: impl Into<String>, runner: InferenceRunner) -> Self {
        Self {
            name: name.into(),
            runner,
        }
    }
}

#[async_trait]
impl ToxicityScorer for ModelScorer {
    async fn score(&self, text: &str) -> Result<Prediction> {
        let start = Instant::now();
        let prediction = self.runner.predict(text)?;
        debug!(
            scorer = %self.name,
            toxicity = prediction.toxicity,
            latency_us = start.elapsed().as_micros() as u64,
            "scored comment"
        );
        Ok(prediction)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
