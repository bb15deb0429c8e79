//! Chronological train/validation preparation
//!
//! Keeps rows with a positive `target`, drops rows whose `created_date` does
//! not parse, orders the rest by creation time (ties keep file order) and
//! splits them by position: the first `floor(0.9 * n)` rows train, the rest
//! validate.

use crate::records::{read_csv, write_csv, PreparedRecord, SourceRecord};
use crate::timestamp::{format_timestamp, parse_created_date};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toxguard_core::{Error, Result};
use tracing::{info, warn};

/// Inputs and outputs of a preprocessing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,

    #[serde(default = "default_train_out")]
    pub train_out: PathBuf,

    #[serde(default = "default_val_out")]
    pub val_out: PathBuf,

    /// Leading share of the ordered rows used for training
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            train_out: default_train_out(),
            val_out: default_val_out(),
            train_fraction: default_train_fraction(),
        }
    }
}

/// Row counts of a preprocessing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreprocessReport {
    pub read: usize,
    /// Rows without a positive target
    pub filtered_out: usize,
    /// Positive rows dropped for an unparseable date
    pub invalid_dates: usize,
    pub train: usize,
    pub validation: usize,
}

/// Read, filter, order, split and write
pub fn run(config: &PreprocessConfig) -> Result<PreprocessReport> {
    if !(0.0..=1.0).contains(&config.train_fraction) {
        return Err(Error::config("train_fraction must be within [0, 1]"));
    }

    let rows: Vec<SourceRecord> = read_csv(&config.input)?;
    let read = rows.len();
    info!("Read {} rows from {}", read, config.input.display());

    let (records, mut report) = prepare(rows);
    report.read = read;

    let train_size = (config.train_fraction * records.len() as f64).floor() as usize;
    let (train, validation) = records.split_at(train_size);
    report.train = train.len();
    report.validation = validation.len();

    write_csv(&config.train_out, train)?;
    write_csv(&config.val_out, validation)?;

    info!(
        "Preprocessing complete! Training samples: {}, Validation samples: {}",
        report.train, report.validation
    );
    Ok(report)
}

/// Filter and order source rows, returning the nine-column records
pub fn prepare(rows: Vec<SourceRecord>) -> (Vec<PreparedRecord>, PreprocessReport) {
    let mut report = PreprocessReport::default();
    let mut dated: Vec<(DateTime<Utc>, SourceRecord)> = Vec::with_capacity(rows.len());

    for row in rows {
        if !row.target.is_some_and(|target| target > 0.0) {
            report.filtered_out += 1;
            continue;
        }
        match row.created_date.as_deref().and_then(parse_created_date) {
            Some(timestamp) => dated.push((timestamp, row)),
            None => report.invalid_dates += 1,
        }
    }

    if report.invalid_dates > 0 {
        warn!("Dropped {} rows with invalid created_date", report.invalid_dates);
    }

    // sort_by_key is stable, so equal timestamps keep file order
    dated.sort_by_key(|(timestamp, _)| *timestamp);

    let records = dated
        .into_iter()
        .map(|(timestamp, row)| PreparedRecord {
            comment_text: row.comment_text,
            target: row.target,
            severe_toxicity: row.severe_toxicity,
            obscene: row.obscene,
            identity_attack: row.identity_attack,
            insult: row.insult,
            threat: row.threat,
            sexual_explicit: row.sexual_explicit,
            created_date: format_timestamp(&timestamp),
        })
        .collect();

    (records, report)
}

fn default_input() -> PathBuf {
    PathBuf::from("train.csv")
}

fn default_train_out() -> PathBuf {
    PathBuf::from("training.csv")
}

fn default_val_out() -> PathBuf {
    PathBuf::from("validation.csv")
}

fn default_train_fraction() -> f64 {
    0.9
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str, target: Option<f64>, date: Option<&str>) -> SourceRecord {
        SourceRecord {
            comment_text: Some(text.to_string()),
            target,
            severe_toxicity: Some(0.0),
            obscene: Some(0.0),
            identity_attack: Some(0.0),
            insult: Some(0.0),
            threat: Some(0.0),
            sexual_explicit: Some(0.0),
            created_date: date.map(String::from),
        }
    }

    #[test]
    fn test_prepare_filters_and_orders() {
        let rows = vec![
            source("late", Some(0.3), Some("2017-05-01 00:00:00+00")),
            source("zero", Some(0.0), Some("2017-01-01")),
            source("missing target", None, Some("2017-01-01")),
            source("bad date", Some(0.8), Some("not a date")),
            source("no date", Some(0.8), None),
            source("early", Some(0.1), Some("2016-01-01")),
            source("tie a", Some(0.2), Some("2017-02-01")),
            source("tie b", Some(0.2), Some("2017-02-01")),
        ];

        let (records, report) = prepare(rows);
        let texts: Vec<&str> = records
            .iter()
            .map(|r| r.comment_text.as_deref().unwrap())
            .collect();
        assert_eq!(texts, ["early", "tie a", "tie b", "late"]);
        assert_eq!(report.filtered_out, 2);
        assert_eq!(report.invalid_dates, 2);
        assert_eq!(records[0].created_date, "2016-01-01 00:00:00.000000+00:00");
    }

    #[test]
    fn test_defaults() {
        let config = PreprocessConfig::default();
        assert_eq!(config.train_out, PathBuf::from("training.csv"));
        assert_eq!(config.val_out, PathBuf::from("validation.csv"));
        assert_eq!(config.train_fraction, 0.9);
    }
}
