//! BERT encoder built from differentiable tensor ops
//!
//! Parameter names follow the Hugging Face BERT checkpoint layout
//! (`embeddings.*`, `encoder.layer.{i}.*`), so any checkpoint that loads into
//! `candle_transformers`' `BertModel` loads here too. Layer norms are computed
//! from mean and variance reductions instead of the fused kernel, which has no
//! backward pass; every encoder tensor held as a variable receives a gradient.

use candle_core::{DType, Module, Result, Tensor, D};
use candle_nn::{embedding, linear, Embedding, Init, Linear, VarBuilder};
use candle_transformers::models::bert::{Config as BertConfig, HiddenAct};

/// Additive attention score for padded positions
const MASKED_SCORE: f64 = -10000.0;

/// Affine normalization over the last dimension
#[derive(Debug, Clone)]
pub struct LayerNorm {
    weight: Tensor,
    bias: Tensor,
    eps: f64,
}

impl LayerNorm {
    pub fn load(size: usize, eps: f64, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            weight: vb.get_with_hints(size, "weight", Init::Const(1.0))?,
            bias: vb.get_with_hints(size, "bias", Init::Const(0.0))?,
            eps,
        })
    }
}

impl Module for LayerNorm {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mean = x.mean_keepdim(D::Minus1)?;
        let centered = x.broadcast_sub(&mean)?;
        let variance = centered.sqr()?.mean_keepdim(D::Minus1)?;
        let std = (variance + self.eps)?.sqrt()?;
        centered
            .broadcast_div(&std)?
            .broadcast_mul(&self.weight)?
            .broadcast_add(&self.bias)
    }
}

struct Embeddings {
    word: Embedding,
    position: Embedding,
    token_type: Embedding,
    layer_norm: LayerNorm,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            word: embedding(config.vocab_size, hidden, vb.pp("word_embeddings"))?,
            position: embedding(config.max_position_embeddings, hidden, vb.pp("position_embeddings"))?,
            token_type: embedding(config.type_vocab_size, hidden, vb.pp("token_type_embeddings"))?,
            layer_norm: LayerNorm::load(hidden, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor) -> Result<Tensor> {
        let seq_len = input_ids.dim(1)?;
        let positions = Tensor::arange(0u32, seq_len as u32, input_ids.device())?;
        let embedded = self
            .word
            .forward(input_ids)?
            .add(&self.token_type.forward(token_type_ids)?)?
            .broadcast_add(&self.position.forward(&positions)?)?;
        self.layer_norm.forward(&embedded)
    }
}

struct Attention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    layer_norm: LayerNorm,
    num_heads: usize,
    head_size: usize,
}

impl Attention {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            query: linear(hidden, hidden, vb.pp("self.query"))?,
            key: linear(hidden, hidden, vb.pp("self.key"))?,
            value: linear(hidden, hidden, vb.pp("self.value"))?,
            output: linear(hidden, hidden, vb.pp("output.dense"))?,
            layer_norm: LayerNorm::load(hidden, config.layer_norm_eps, vb.pp("output.LayerNorm"))?,
            num_heads: config.num_attention_heads,
            head_size: hidden / config.num_attention_heads,
        })
    }

    /// `[batch, seq, hidden]` to `[batch, heads, seq, head_size]`
    fn split_heads(&self, x: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = x.dims3()?;
        x.reshape((batch, seq_len, self.num_heads, self.head_size))?
            .transpose(1, 2)?
            .contiguous()
    }

    fn forward(&self, hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let query = self.split_heads(&self.query.forward(hidden)?)?;
        let key = self.split_heads(&self.key.forward(hidden)?)?;
        let value = self.split_heads(&self.value.forward(hidden)?)?;

        let scores = (query.matmul(&key.t()?)? / (self.head_size as f64).sqrt())?;
        let weights = candle_nn::ops::softmax(&scores.broadcast_add(mask)?, D::Minus1)?;
        let context = weights
            .matmul(&value)?
            .transpose(1, 2)?
            .contiguous()?
            .flatten_from(2)?;

        self.layer_norm
            .forward(&(self.output.forward(&context)? + hidden)?)
    }
}

struct Layer {
    attention: Attention,
    intermediate: Linear,
    output: Linear,
    layer_norm: LayerNorm,
    activation: HiddenAct,
}

impl Layer {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            attention: Attention::load(vb.pp("attention"), config)?,
            intermediate: linear(hidden, config.intermediate_size, vb.pp("intermediate.dense"))?,
            output: linear(config.intermediate_size, hidden, vb.pp("output.dense"))?,
            layer_norm: LayerNorm::load(hidden, config.layer_norm_eps, vb.pp("output.LayerNorm"))?,
            activation: config.hidden_act,
        })
    }

    fn forward(&self, hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let attended = self.attention.forward(hidden, mask)?;
        let inner = self.intermediate.forward(&attended)?;
        let inner = match self.activation {
            HiddenAct::Gelu => inner.gelu_erf()?,
            HiddenAct::GeluApproximate => inner.gelu()?,
            HiddenAct::Relu => inner.relu()?,
        };
        self.layer_norm
            .forward(&(self.output.forward(&inner)? + attended)?)
    }
}

/// Embeddings plus the stack of transformer layers
pub struct BertEncoder {
    embeddings: Embeddings,
    layers: Vec<Layer>,
}

impl BertEncoder {
    /// Load from a builder rooted at the encoder prefix (`bert`)
    pub fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let embeddings = Embeddings::load(vb.pp("embeddings"), config)?;
        let layers = (0..config.num_hidden_layers)
            .map(|index| Layer::load(vb.pp(format!("encoder.layer.{}", index)), config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { embeddings, layers })
    }

    /// Hidden states `[batch, seq, hidden]` for `[batch, seq]` inputs.
    ///
    /// `attention_mask` holds 1 for real tokens and 0 for padding.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let mask = additive_mask(attention_mask)?;
        let mut hidden = self.embeddings.forward(input_ids, token_type_ids)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden, &mask)?;
        }
        Ok(hidden)
    }
}

/// `[batch, seq]` keep-mask to `[batch, 1, 1, seq]` score offsets
fn additive_mask(attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq_len) = attention_mask.dims2()?;
    attention_mask
        .to_dtype(DType::F32)?
        .reshape((batch, 1, 1, seq_len))?
        .affine(-MASKED_SCORE, MASKED_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use candle_nn::VarMap;

    #[test]
    fn test_layer_norm_matches_fused_kernel() {
        let device = Device::Cpu;
        let x = Tensor::new(&[[1.0f32, 2.0, 4.0, 7.0], [-3.0, 0.5, 0.5, 2.0]], &device).unwrap();
        let weight = Tensor::new(&[1.0f32, 0.5, 2.0, -1.0], &device).unwrap();
        let bias = Tensor::new(&[0.0f32, 0.1, -0.2, 0.3], &device).unwrap();

        let norm = LayerNorm {
            weight: weight.clone(),
            bias: bias.clone(),
            eps: 1e-5,
        };
        let ours = norm.forward(&x).unwrap().to_vec2::<f32>().unwrap();
        let fused = candle_nn::ops::layer_norm(&x, &weight, &bias, 1e-5)
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();

        for (a, b) in ours.iter().flatten().zip(fused.iter().flatten()) {
            assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_layer_norm_has_gradients() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let norm = LayerNorm::load(3, 1e-12, vb.pp("LayerNorm")).unwrap();

        let x = Tensor::new(&[[1.0f32, 2.0, 6.0]], &device).unwrap();
        let loss = norm.forward(&x).unwrap().sqr().unwrap().sum_all().unwrap();
        let grads = loss.backward().unwrap();

        for var in varmap.all_vars() {
            assert!(grads.get(var.as_tensor()).is_some());
        }
    }

    #[test]
    fn test_additive_mask() {
        let mask = Tensor::new(&[[1u32, 1, 0]], &Device::Cpu).unwrap();
        let offsets = additive_mask(&mask).unwrap();
        assert_eq!(offsets.dims(), &[1, 1, 1, 3]);
        assert_eq!(
            offsets.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
            vec![0.0, 0.0, -10000.0]
        );
    }
}
