//! Pretrained encoder resolution
//!
//! Locates `config.json`, `tokenizer.json` and (for training) `model.safetensors`
//! either in a local directory or in the Hugging Face Hub cache, downloading on
//! first use.

use crate::config::PretrainedSource;
use candle_transformers::models::bert::Config as BertConfig;
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toxguard_core::{Error, Result};

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Files making up a pretrained encoder
#[derive(Debug, Clone)]
pub struct PretrainedFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,

    /// Encoder weights; only resolved when training
    pub weights: Option<PathBuf>,
}

impl PretrainedFiles {
    /// Encoder weights, required for training
    pub fn weights(&self) -> Result<&Path> {
        self.weights
            .as_deref()
            .ok_or_else(|| Error::config("Pretrained encoder weights were not resolved"))
    }
}

/// Resolve pretrained encoder files, downloading from the hub when needed
pub fn resolve_pretrained(source: &PretrainedSource, with_weights: bool) -> Result<PretrainedFiles> {
    match source {
        PretrainedSource::Local { path } => resolve_local(path, with_weights),
        PretrainedSource::HuggingFace { repo_id, revision } => {
            download_from_huggingface(repo_id, revision.as_deref(), with_weights)
        }
    }
}

fn resolve_local(dir: &Path, with_weights: bool) -> Result<PretrainedFiles> {
    if !dir.is_dir() {
        return Err(Error::config(format!(
            "Pretrained model directory does not exist: {}",
            dir.display()
        )));
    }

    let require = |name: &str| -> Result<PathBuf> {
        let path = dir.join(name);
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::config(format!("Missing {} in {}", name, dir.display())))
        }
    };

    Ok(PretrainedFiles {
        config: require(CONFIG_FILE)?,
        tokenizer: require(TOKENIZER_FILE)?,
        weights: if with_weights {
            Some(require(WEIGHTS_FILE)?)
        } else {
            None
        },
    })
}

fn download_from_huggingface(
    repo_id: &str,
    revision: Option<&str>,
    with_weights: bool,
) -> Result<PretrainedFiles> {
    let revision = revision.unwrap_or("main");
    tracing::info!("Resolving pretrained encoder {} @ {}", repo_id, revision);

    let api = Api::new()
        .map_err(|e| Error::config(format!("Failed to initialize HuggingFace API: {}", e)))?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let fetch = |name: &str| -> Result<PathBuf> {
        tracing::debug!("Fetching {}", name);
        repo.get(name)
            .map_err(|e| Error::config(format!("Failed to download {}: {}", name, e)))
    };

    let files = PretrainedFiles {
        config: fetch(CONFIG_FILE)?,
        tokenizer: fetch(TOKENIZER_FILE)?,
        weights: if with_weights {
            Some(fetch(WEIGHTS_FILE)?)
        } else {
            None
        },
    };

    tracing::info!("Pretrained encoder available at {}", files.config.display());
    Ok(files)
}

#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

/// Parse a BERT `config.json`
pub fn load_bert_config(path: &Path) -> Result<BertConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;

    // Catch configs for other architectures before Candle reports a less obvious field error
    serde_json::from_str::<HiddenSize>(&content).map_err(|e| {
        Error::config(format!("{} is not a BERT config: {}", path.display(), e))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))
}
