//! Three-way timestamp split: train / validation / production

use crate::records::{read_csv, write_csv, SplitRecord};
use crate::timestamp::{format_timestamp, parse_created_date};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toxguard_core::{Error, Result};
use tracing::{info, warn};

pub const TRAIN_FILE: &str = "train.csv";
pub const VAL_FILE: &str = "val.csv";
pub const PRODUCTION_FILE: &str = "production.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Directory receiving `train.csv`, `val.csv` and `production.csv`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Chronologically leading share kept for train and validation
    #[serde(default = "default_history_fraction")]
    pub history_fraction: f64,

    /// Share of the history drawn at random for validation
    #[serde(default = "default_val_fraction")]
    pub val_fraction: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            history_fraction: default_history_fraction(),
            val_fraction: default_val_fraction(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitReport {
    pub read: usize,
    /// Rows dropped for an unparseable `created_date`
    pub invalid_dates: usize,
    pub train: usize,
    pub validation: usize,
    pub production: usize,
}

impl SplitReport {
    /// Rows that survived filtering; always `train + validation + production`
    pub fn filtered(&self) -> usize {
        self.read - self.invalid_dates
    }
}

/// Partitioned rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub train: Vec<SplitRecord>,
    pub validation: Vec<SplitRecord>,
    pub production: Vec<SplitRecord>,
}

/// Read, split and write the three subsets
pub fn run(config: &SplitConfig) -> Result<SplitReport> {
    let rows: Vec<SplitRecord> = read_csv(&config.input)?;
    let read = rows.len();
    info!("Read {} rows from {}", read, config.input.display());

    let (partition, invalid_dates) = partition(rows, config)?;
    if invalid_dates > 0 {
        warn!("Dropped {} rows with invalid created_date", invalid_dates);
    }

    let dir = &config.output_dir;
    write_csv(&dir.join(TRAIN_FILE), &partition.train)?;
    write_csv(&dir.join(VAL_FILE), &partition.validation)?;
    write_csv(&dir.join(PRODUCTION_FILE), &partition.production)?;

    let report = SplitReport {
        read,
        invalid_dates,
        train: partition.train.len(),
        validation: partition.validation.len(),
        production: partition.production.len(),
    };
    info!(
        "Split complete: train={}, val={}, production={}",
        report.train, report.validation, report.production
    );
    Ok(report)
}

/// Split rows without touching the filesystem; also returns the invalid-date count
pub fn partition(rows: Vec<SplitRecord>, config: &SplitConfig) -> Result<(Partition, usize)> {
    for (name, value) in [
        ("history_fraction", config.history_fraction),
        ("val_fraction", config.val_fraction),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::config(format!("{} must be within [0, 1]", name)));
        }
    }

    let total = rows.len();
    let mut dated: Vec<_> = rows
        .into_iter()
        .filter_map(|mut row| {
            let timestamp = parse_created_date(&row.created_date)?;
            row.created_date = format_timestamp(&timestamp);
            Some((timestamp, row))
        })
        .collect();
    let invalid_dates = total - dated.len();

    dated.sort_by_key(|(timestamp, _)| *timestamp);
    let mut history: Vec<SplitRecord> = dated.into_iter().map(|(_, row)| row).collect();

    let split_index = (history.len() as f64 * config.history_fraction).floor() as usize;
    let production = history.split_off(split_index);

    let mut rng = StdRng::seed_from_u64(config.seed);
    history.shuffle(&mut rng);
    let val_size = ((history.len() as f64 * config.val_fraction).ceil() as usize).min(history.len());
    let train = history.split_off(val_size);

    Ok((
        Partition {
            train,
            validation: history,
            production,
        },
        invalid_dates,
    ))
}

fn default_input() -> PathBuf {
    PathBuf::from("train.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_history_fraction() -> f64 {
    0.9
}

fn default_val_fraction() -> f64 {
    0.1111
}

fn default_seed() -> u64 {
    42
}
