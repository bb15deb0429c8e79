//! ToxGuard Core
//!
//! Core types and utilities shared across ToxGuard components.
//!
//! This crate provides:
//! - The six toxicity subtype labels and the binary appropriateness label
//! - Prediction and sample types passed between training, inference and serving
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    binarize, Prediction, Sample, SubtypeLabel, ToxicityLabel, DECISION_THRESHOLD, NUM_SUBTYPES,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Prediction, Sample, SubtypeLabel, ToxicityLabel, DECISION_THRESHOLD};
}
