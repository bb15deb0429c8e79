//! Offline fixtures: a tiny BERT with a word-level tokenizer and random weights

#![allow(dead_code)]

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HIDDEN_SIZE: usize = 16;

pub const BERT_CONFIG: &str = r#"{
  "vocab_size": 32,
  "hidden_size": 16,
  "num_hidden_layers": 1,
  "num_attention_heads": 2,
  "intermediate_size": 32,
  "hidden_act": "gelu",
  "hidden_dropout_prob": 0.0,
  "max_position_embeddings": 64,
  "type_vocab_size": 2,
  "initializer_range": 0.02,
  "layer_norm_eps": 1e-12,
  "pad_token_id": 0,
  "position_embedding_type": "absolute",
  "use_cache": true,
  "classifier_dropout": null,
  "model_type": "bert"
}"#;

pub const TOKENIZER: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": {"type": "Lowercase"},
  "pre_tokenizer": {"type": "Whitespace"},
  "post_processor": {"type": "BertProcessing", "sep": ["[SEP]", 3], "cls": ["[CLS]", 2]},
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": {
      "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
      "you": 4, "are": 5, "great": 6, "i": 7, "will": 8, "hurt": 9,
      "this": 10, "is": 11, "a": 12, "nice": 13, "comment": 14, "stupid": 15,
      "idiot": 16, "thanks": 17, "for": 18, "sharing": 19
    },
    "unk_token": "[UNK]"
  }
}"#;

/// Write config, tokenizer and random encoder weights into `dir`
pub fn write_pretrained(dir: &Path) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("config.json"), BERT_CONFIG).unwrap();
    std::fs::write(dir.join("tokenizer.json"), TOKENIZER).unwrap();

    let config: BertConfig = serde_json::from_str(BERT_CONFIG).unwrap();
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    BertModel::load(vb.pp("bert"), &config).unwrap();
    candle_nn::linear(HIDDEN_SIZE, HIDDEN_SIZE, vb.pp("bert.pooler.dense")).unwrap();
    varmap.save(dir.join("model.safetensors")).unwrap();

    dir.to_path_buf()
}

/// Fresh temp directory holding a `pretrained/` fixture
pub fn pretrained_fixture() -> (TempDir, PathBuf) {
    let root = TempDir::new().unwrap();
    let path = write_pretrained(&root.path().join("pretrained"));
    (root, path)
}

pub const TRAIN_CSV: &str = "\
comment_text,target,severe_toxicity,obscene,identity_attack,insult,threat,sexual_explicit
you are great,0.0,0.0,0.0,0.0,0.0,0.0,0.0
I will hurt you,0.9,0.1,0.0,0.0,0.2,0.8,0.0
";

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
