//! Fixed-length text encoding
//!
//! Wraps a pretrained subword tokenizer so that every comment, whatever its
//! length, becomes exactly `max_length` token ids plus a matching attention
//! mask. Longer inputs are truncated on the right, shorter ones padded.

use candle_core::{Device, Tensor};
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use toxguard_core::{Error, Result};

const DEFAULT_PAD_TOKEN: &str = "[PAD]";

/// Tokenizer configured for fixed-shape batches
pub struct TextEncoder {
    tokenizer: Tokenizer,
    max_length: usize,
}

/// Token ids, attention mask and segment ids for a batch, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub batch_size: usize,
    pub seq_len: usize,
}

impl TextEncoder {
    /// Configure `tokenizer` to pad and truncate to `max_length`
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        let (pad_id, pad_token) = match tokenizer.get_padding() {
            Some(existing) => (existing.pad_id, existing.pad_token.clone()),
            None => (
                tokenizer.token_to_id(DEFAULT_PAD_TOKEN).unwrap_or(0),
                DEFAULT_PAD_TOKEN.to_string(),
            ),
        };

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| Error::tokenizer(format!("Failed to configure truncation: {}", e)))?;

        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    /// Load a `tokenizer.json` and configure it
    pub fn from_file(path: impl AsRef<Path>, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            Error::tokenizer(format!("Failed to load tokenizer {}: {}", path.display(), e))
        })?;
        Self::new(tokenizer, max_length)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Encode a batch of comments into fixed-length sequences
    pub fn encode_batch(&self, texts: &[&str]) -> Result<EncodedBatch> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::tokenizer(format!("Tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let seq_len = self.max_length;
        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        let mut token_type_ids = Vec::with_capacity(batch_size * seq_len);

        for encoding in &encodings {
            if encoding.get_ids().len() != seq_len {
                return Err(Error::tokenizer(format!(
                    "Encoding has length {} instead of {}",
                    encoding.get_ids().len(),
                    seq_len
                )));
            }
            input_ids.extend_from_slice(encoding.get_ids());
            attention_mask.extend_from_slice(encoding.get_attention_mask());
            token_type_ids.extend_from_slice(encoding.get_type_ids());
        }

        Ok(EncodedBatch {
            input_ids,
            attention_mask,
            token_type_ids,
            batch_size,
            seq_len,
        })
    }
}

impl EncodedBatch {
    /// Token ids of one row
    pub fn row_ids(&self, row: usize) -> &[u32] {
        &self.input_ids[row * self.seq_len..(row + 1) * self.seq_len]
    }

    /// Attention mask of one row
    pub fn row_mask(&self, row: usize) -> &[u32] {
        &self.attention_mask[row * self.seq_len..(row + 1) * self.seq_len]
    }

    /// `(input_ids, token_type_ids, attention_mask)` as `[batch, seq_len]` tensors
    pub fn to_tensors(&self, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
        let shape = (self.batch_size, self.seq_len);
        let build = |data: &[u32]| {
            Tensor::from_slice(data, shape, device)
                .map_err(|e| Error::model(format!("Failed to create input tensor: {}", e)))
        };
        Ok((
            build(&self.input_ids)?,
            build(&self.token_type_ids)?,
            build(&self.attention_mask)?,
        ))
    }
}
