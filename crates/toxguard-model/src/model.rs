//! BERT encoder with toxicity and subtype heads

use crate::candle_err;
use crate::encoder::BertEncoder;
use candle_core::{IndexOp, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use candle_transformers::models::bert::Config as BertConfig;
use toxguard_core::{Prediction, Result, NUM_SUBTYPES};

/// Parameter prefix of the encoder
pub const ENCODER_PREFIX: &str = "bert";
/// Parameter prefix of the pooler dense layer
pub const POOLER_PREFIX: &str = "bert.pooler.dense";
/// Parameter prefix of the toxicity head
pub const TOXICITY_HEAD: &str = "tox_head";
/// Parameter prefix of the subtype head
pub const SUBTYPE_HEAD: &str = "subtype_head";

/// Pretrained encoder plus two linear heads over the pooled `[CLS]` vector
pub struct ToxicityModel {
    encoder: BertEncoder,
    pooler: Linear,
    tox_head: Linear,
    subtype_head: Linear,
}

/// Raw head outputs for a batch
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// `[batch]`
    pub toxicity_logits: Tensor,
    /// `[batch, NUM_SUBTYPES]`
    pub subtype_logits: Tensor,
}

impl ToxicityModel {
    /// Build the model from two variable sources.
    ///
    /// `encoder_vb` supplies every `bert.*` tensor. The pooler is taken from
    /// it when present and otherwise created through `head_vb`, which also
    /// supplies both heads.
    pub fn load(encoder_vb: VarBuilder, head_vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let encoder = BertEncoder::load(encoder_vb.pp(ENCODER_PREFIX), config)
            .map_err(candle_err("Failed to load BERT encoder"))?;

        let hidden = config.hidden_size;
        let pooler_vb = if encoder_vb.contains_tensor(&format!("{}.weight", POOLER_PREFIX)) {
            encoder_vb.pp(POOLER_PREFIX)
        } else {
            tracing::debug!("Encoder has no pooler weights, initializing a fresh pooler");
            head_vb.pp(POOLER_PREFIX)
        };
        let pooler =
            linear(hidden, hidden, pooler_vb).map_err(candle_err("Failed to load pooler"))?;
        let tox_head = linear(hidden, 1, head_vb.pp(TOXICITY_HEAD))
            .map_err(candle_err("Failed to load toxicity head"))?;
        let subtype_head = linear(hidden, NUM_SUBTYPES, head_vb.pp(SUBTYPE_HEAD))
            .map_err(candle_err("Failed to load subtype head"))?;

        Ok(Self {
            encoder,
            pooler,
            tox_head,
            subtype_head,
        })
    }

    /// Run the encoder and both heads on a `[batch, seq_len]` input
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<ModelOutput> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, attention_mask)
            .map_err(candle_err("Encoder forward pass failed"))?;

        let pooled = hidden
            .i((.., 0))
            .and_then(|cls| cls.contiguous())
            .and_then(|cls| self.pooler.forward(&cls))
            .and_then(|dense| dense.tanh())
            .map_err(candle_err("Pooling failed"))?;

        let toxicity_logits = self
            .tox_head
            .forward(&pooled)
            .and_then(|logits| logits.squeeze(1))
            .map_err(candle_err("Toxicity head failed"))?;
        let subtype_logits = self
            .subtype_head
            .forward(&pooled)
            .map_err(candle_err("Subtype head failed"))?;

        Ok(ModelOutput {
            toxicity_logits,
            subtype_logits,
        })
    }
}

impl ModelOutput {
    /// Sigmoid of the toxicity logits, `[batch]`
    pub fn toxicity_probabilities(&self) -> Result<Tensor> {
        candle_nn::ops::sigmoid(&self.toxicity_logits)
            .map_err(candle_err("Sigmoid failed"))
    }

    /// Sigmoid of the subtype logits, `[batch, NUM_SUBTYPES]`
    pub fn subtype_probabilities(&self) -> Result<Tensor> {
        candle_nn::ops::sigmoid(&self.subtype_logits)
            .map_err(candle_err("Sigmoid failed"))
    }

    /// Per-row predictions, copied to the host
    pub fn predictions(&self) -> Result<Vec<Prediction>> {
        let toxicity = self
            .toxicity_probabilities()?
            .to_vec1::<f32>()
            .map_err(candle_err("Failed to read toxicity probabilities"))?;
        let subtypes = self
            .subtype_probabilities()?
            .to_vec2::<f32>()
            .map_err(candle_err("Failed to read subtype probabilities"))?;

        Ok(toxicity
            .into_iter()
            .zip(subtypes)
            .map(|(tox, row)| {
                let mut scores = [0.0; NUM_SUBTYPES];
                for (slot, value) in scores.iter_mut().zip(row) {
                    *slot = value;
                }
                Prediction::new(tox, scores)
            })
            .collect())
    }
}
