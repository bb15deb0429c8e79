//! Parameter storage for the classifier
//!
//! Pretrained encoder tensors are held either as frozen constants or as
//! trainable variables; the heads (and a pooler missing from the checkpoint)
//! are always trainable and created on first use by [`ToxicityModel::load`].
//! Saving merges both sets into one safetensors blob, which is also the
//! format read back for inference.
//!
//! [`ToxicityModel::load`]: crate::model::ToxicityModel::load

use crate::candle_err;
use crate::model::ENCODER_PREFIX;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use std::collections::HashMap;
use std::path::Path;
use toxguard_core::{Error, Result};
use tracing::{debug, info};

/// Frozen and trainable tensors backing a [`ToxicityModel`](crate::ToxicityModel)
pub struct ParameterStore {
    frozen: HashMap<String, Tensor>,
    trainable: VarMap,
    mode: Mode,
    device: Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Encoder and heads train
    FineTune,
    /// Only the heads train
    FrozenEncoder,
    /// Nothing trains
    Inference,
}

impl ParameterStore {
    /// Load pretrained encoder weights for training.
    ///
    /// With `fine_tune_encoder` the encoder tensors become trainable
    /// variables; otherwise they stay constant and only the heads train.
    pub fn pretrained(weights: &Path, device: &Device, fine_tune_encoder: bool) -> Result<Self> {
        let raw = load_tensors(weights, device)?;
        let total = raw.len();
        let tensors = normalize_pretrained(raw);
        info!(
            "Loaded {} encoder tensors ({} ignored) from {}",
            tensors.len(),
            total - tensors.len(),
            weights.display()
        );

        let trainable = VarMap::new();
        let mode = if fine_tune_encoder {
            Mode::FineTune
        } else {
            Mode::FrozenEncoder
        };
        let frozen = if fine_tune_encoder {
            let mut data = trainable
                .data()
                .lock()
                .map_err(|_| Error::internal("Parameter map lock poisoned"))?;
            for (name, tensor) in tensors {
                let var = Var::from_tensor(&tensor).map_err(candle_err("Failed to create variable"))?;
                data.insert(name, var);
            }
            HashMap::new()
        } else {
            tensors
        };

        Ok(Self {
            frozen,
            trainable,
            mode,
            device: device.clone(),
        })
    }

    /// Load a trained weight file for inference; nothing is trainable
    pub fn trained(weights: &Path, device: &Device) -> Result<Self> {
        let frozen = load_tensors(weights, device)?;
        info!("Loaded {} tensors from {}", frozen.len(), weights.display());
        Ok(Self {
            frozen,
            trainable: VarMap::new(),
            mode: Mode::Inference,
            device: device.clone(),
        })
    }

    /// Variable source for the encoder
    pub fn encoder_vb(&self) -> VarBuilder<'static> {
        match self.mode {
            Mode::FineTune => self.trainable_vb(),
            Mode::FrozenEncoder | Mode::Inference => self.frozen_vb(),
        }
    }

    /// Variable source for the heads
    pub fn head_vb(&self) -> VarBuilder<'static> {
        match self.mode {
            Mode::FineTune | Mode::FrozenEncoder => self.trainable_vb(),
            Mode::Inference => self.frozen_vb(),
        }
    }

    fn trainable_vb(&self) -> VarBuilder<'static> {
        VarBuilder::from_varmap(&self.trainable, DType::F32, &self.device)
    }

    fn frozen_vb(&self) -> VarBuilder<'static> {
        VarBuilder::from_tensors(self.frozen.clone(), DType::F32, &self.device)
    }

    /// Whether encoder tensors receive gradient updates
    pub fn fine_tunes_encoder(&self) -> bool {
        self.mode == Mode::FineTune
    }

    /// Variables the optimizer updates
    pub fn trainable_vars(&self) -> Vec<Var> {
        self.trainable.all_vars()
    }

    /// Named `bert.*` variables; empty unless the encoder is fine-tuned
    pub fn encoder_vars(&self) -> Result<Vec<(String, Var)>> {
        if self.mode != Mode::FineTune {
            return Ok(Vec::new());
        }
        let prefix = format!("{}.", ENCODER_PREFIX);
        let data = self
            .trainable
            .data()
            .lock()
            .map_err(|_| Error::internal("Parameter map lock poisoned"))?;
        let mut vars: Vec<(String, Var)> = data
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, var)| (name.clone(), var.clone()))
            .collect();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(vars)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Write every parameter, frozen and trainable, into one safetensors file
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut tensors = self.frozen.clone();
        {
            let data = self
                .trainable
                .data()
                .lock()
                .map_err(|_| Error::internal("Parameter map lock poisoned"))?;
            for (name, var) in data.iter() {
                tensors.insert(name.clone(), var.as_tensor().clone());
            }
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        candle_core::safetensors::save(&tensors, path)
            .map_err(candle_err("Failed to save weights"))?;
        debug!("Saved {} tensors to {}", tensors.len(), path.display());
        Ok(())
    }
}

fn load_tensors(path: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    if !path.exists() {
        return Err(Error::model(format!(
            "Weight file does not exist: {}",
            path.display()
        )));
    }
    let tensors = candle_core::safetensors::load(path, device)
        .map_err(|e| Error::model(format!("Failed to read {}: {}", path.display(), e)))?;

    tensors
        .into_iter()
        .map(|(name, tensor)| {
            let tensor = if tensor.dtype() == DType::F32 {
                tensor
            } else {
                tensor
                    .to_dtype(DType::F32)
                    .map_err(candle_err("Failed to convert weights to f32"))?
            };
            Ok((name, tensor))
        })
        .collect()
}

/// Map checkpoint tensor names onto the `bert.*` layout and drop the rest
fn normalize_pretrained(tensors: HashMap<String, Tensor>) -> HashMap<String, Tensor> {
    tensors
        .into_iter()
        .filter_map(|(name, tensor)| normalize_name(&name).map(|name| (name, tensor)))
        .collect()
}

fn normalize_name(name: &str) -> Option<String> {
    if name.ends_with("position_ids") {
        return None;
    }

    let prefixed = if name.starts_with("bert.") {
        name.to_string()
    } else if ["embeddings.", "encoder.", "pooler."]
        .iter()
        .any(|prefix| name.starts_with(prefix))
    {
        format!("{}.{}", ENCODER_PREFIX, name)
    } else {
        return None;
    };

    let renamed = if let Some(stem) = prefixed.strip_suffix(".gamma") {
        format!("{}.weight", stem)
    } else if let Some(stem) = prefixed.strip_suffix(".beta") {
        format!("{}.bias", stem)
    } else {
        prefixed
    };
    Some(renamed)
}
