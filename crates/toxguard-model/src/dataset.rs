//! Labeled and unlabeled comment datasets

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use toxguard_core::{binarize, Error, Result, Sample, NUM_SUBTYPES};
use tracing::info;

#[derive(Debug, Deserialize)]
struct LabeledRow {
    #[serde(default)]
    comment_text: Option<String>,
    #[serde(default)]
    target: Option<f32>,
    #[serde(default)]
    severe_toxicity: Option<f32>,
    #[serde(default)]
    obscene: Option<f32>,
    #[serde(default)]
    identity_attack: Option<f32>,
    #[serde(default)]
    insult: Option<f32>,
    #[serde(default)]
    threat: Option<f32>,
    #[serde(default)]
    sexual_explicit: Option<f32>,
}

impl From<LabeledRow> for Sample {
    fn from(row: LabeledRow) -> Self {
        Sample {
            comment_text: row.comment_text.unwrap_or_default(),
            target: row.target.unwrap_or(0.0),
            subtypes: [
                row.severe_toxicity.unwrap_or(0.0),
                row.obscene.unwrap_or(0.0),
                row.identity_attack.unwrap_or(0.0),
                row.insult.unwrap_or(0.0),
                row.threat.unwrap_or(0.0),
                row.sexual_explicit.unwrap_or(0.0),
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    #[serde(default)]
    comment_text: Option<String>,
}

/// One mini-batch of training inputs with binary targets
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingBatch<'a> {
    pub texts: Vec<&'a str>,

    /// 0.0 or 1.0 per row
    pub toxicity: Vec<f32>,

    /// Row-major `[batch, NUM_SUBTYPES]`, 0.0 or 1.0 each
    pub subtypes: Vec<f32>,
}

impl TrainingBatch<'_> {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Comments with toxicity and subtype labels
#[derive(Debug, Clone, Default)]
pub struct ToxicityDataset {
    samples: Vec<Sample>,
}

impl ToxicityDataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Read `comment_text`, `target` and the subtype columns from a CSV
    pub fn from_csv(path: impl AsRef<Path>, max_rows: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::data(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut samples = Vec::new();
        for row in reader.deserialize::<LabeledRow>() {
            if max_rows.is_some_and(|max| samples.len() >= max) {
                break;
            }
            samples.push(Sample::from(row?));
        }

        info!("Loaded {} labeled comments from {}", samples.len(), path.display());
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Build the batch for the given row indices
    pub fn batch(&self, indices: &[usize]) -> TrainingBatch<'_> {
        let mut texts = Vec::with_capacity(indices.len());
        let mut toxicity = Vec::with_capacity(indices.len());
        let mut subtypes = Vec::with_capacity(indices.len() * NUM_SUBTYPES);

        for &index in indices {
            let sample = &self.samples[index];
            texts.push(sample.comment_text.as_str());
            toxicity.push(as_target(binarize(sample.target)));
            subtypes.extend(sample.subtype_targets().map(as_target));
        }

        TrainingBatch {
            texts,
            toxicity,
            subtypes,
        }
    }

    /// Mini-batches in row order, or shuffled when an rng is given
    pub fn batches<'a, R: Rng>(
        &'a self,
        batch_size: usize,
        rng: Option<&mut R>,
    ) -> impl Iterator<Item = TrainingBatch<'a>> + 'a {
        let mut order: Vec<usize> = (0..self.samples.len()).collect();
        if let Some(rng) = rng {
            order.shuffle(rng);
        }

        let batch_size = batch_size.max(1);
        let chunks: Vec<Vec<usize>> = order.chunks(batch_size).map(<[usize]>::to_vec).collect();
        chunks.into_iter().map(move |indices| self.batch(&indices))
    }
}

fn as_target(flag: bool) -> f32 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Unlabeled comments to score
#[derive(Debug, Clone, Default)]
pub struct CommentDataset {
    texts: Vec<String>,
}

impl CommentDataset {
    pub fn new(texts: Vec<String>) -> Self {
        Self { texts }
    }

    /// Read `comment_text` from a CSV; missing text becomes the empty string
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::data(format!("Failed to open {}: {}", path.display(), e)))?;

        let texts = reader
            .deserialize::<CommentRow>()
            .map(|row| row.map(|r| r.comment_text.unwrap_or_default()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        info!("Loaded {} comments from {}", texts.len(), path.display());
        Ok(Self { texts })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }
}
