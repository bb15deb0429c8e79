//! ToxGuard Data
//!
//! Preparation of the labeled comment corpus and replay of held-out
//! "production" comments against a scoring endpoint.
//!
//! - [`preprocess`] keeps positively scored rows, orders them by creation
//!   time and cuts a 90/10 train/validation split without shuffling
//! - [`split`] cuts the chronologically last 10% off as production data and
//!   randomly splits the rest into train and validation
//! - [`replay`] streams production comments to an HTTP endpoint (or prints
//!   them in dry-run mode) at randomized intervals

pub mod preprocess;
pub mod records;
pub mod replay;
pub mod split;
pub mod timestamp;

pub use preprocess::{PreprocessConfig, PreprocessReport};
pub use records::{PreparedRecord, SourceRecord, SplitRecord};
pub use replay::{ReplayClient, ReplayConfig, ReplayError, ReplayReport, RetryPolicy};
pub use split::{SplitConfig, SplitReport};
pub use timestamp::{format_timestamp, parse_created_date};
