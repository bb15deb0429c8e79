//! File-level preprocessing and split runs

use proptest::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use toxguard_data::preprocess::{self, PreprocessConfig};
use toxguard_data::records::{read_csv, PreparedRecord, SplitRecord};
use toxguard_data::split::{self, SplitConfig};

const CORPUS_HEADER: &str =
    "id,comment_text,target,severe_toxicity,obscene,identity_attack,insult,threat,sexual_explicit,created_date,rating";

fn corpus_row(id: usize, text: &str, target: &str, date: &str) -> String {
    format!("{id},{text},{target},0.0,0.0,0.0,0.1,0.0,0.0,{date},approved")
}

fn write(dir: &Path, name: &str, lines: &[String]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("{}\n", lines.join("\n"))).unwrap();
    path
}

#[test]
fn test_preprocess_writes_chronological_split() {
    let dir = TempDir::new().unwrap();
    let mut lines = vec![CORPUS_HEADER.to_string()];
    for day in (1..=20).rev() {
        lines.push(corpus_row(
            day,
            &format!("comment {day}"),
            "0.2",
            &format!("2017-03-{day:02} 10:00:00.5+00"),
        ));
    }
    lines.push(corpus_row(100, "neutral", "0.0", "2017-03-05"));
    lines.push(corpus_row(101, "undated", "0.7", "someday"));

    let input = write(dir.path(), "train.csv", &lines);
    let config = PreprocessConfig {
        input,
        train_out: dir.path().join("training.csv"),
        val_out: dir.path().join("validation.csv"),
        ..Default::default()
    };
    let report = preprocess::run(&config).unwrap();

    assert_eq!(report.read, 22);
    assert_eq!(report.filtered_out, 1);
    assert_eq!(report.invalid_dates, 1);
    assert_eq!(report.train, 18);
    assert_eq!(report.validation, 2);

    let train: Vec<PreparedRecord> = read_csv(&config.train_out).unwrap();
    let val: Vec<PreparedRecord> = read_csv(&config.val_out).unwrap();
    assert_eq!(train.first().unwrap().comment_text.as_deref(), Some("comment 1"));
    assert_eq!(train.last().unwrap().comment_text.as_deref(), Some("comment 18"));
    assert_eq!(val[1].comment_text.as_deref(), Some("comment 20"));
    assert!(train.iter().all(|r| r.target.unwrap() > 0.0));

    let header = std::fs::read_to_string(&config.val_out).unwrap();
    assert!(header.starts_with("comment_text,target,severe_toxicity,"));
    assert!(!header.contains("rating"));
}

#[test]
fn test_split_writes_three_files() {
    let dir = TempDir::new().unwrap();
    let mut lines = vec!["comment_text,target,created_date".to_string()];
    for i in 0..50 {
        lines.push(format!("comment {i},0.{},2018-01-01 00:{:02}:00", i % 10, i));
    }
    let input = write(dir.path(), "train.csv", &lines);
    let out = dir.path().join("splits");

    let report = split::run(&SplitConfig {
        input,
        output_dir: out.clone(),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(report.production, 5);
    assert_eq!(report.validation, 5);
    assert_eq!(report.train, 40);

    let production: Vec<SplitRecord> = read_csv(&out.join("production.csv")).unwrap();
    let texts: Vec<_> = production
        .iter()
        .map(|r| r.comment_text.clone().unwrap())
        .collect();
    assert_eq!(
        texts,
        ["comment 45", "comment 46", "comment 47", "comment 48", "comment 49"]
    );
    assert_eq!(read_csv::<SplitRecord>(&out.join("train.csv")).unwrap().len(), 40);
    assert_eq!(read_csv::<SplitRecord>(&out.join("val.csv")).unwrap().len(), 5);
}

fn arb_rows() -> impl Strategy<Value = Vec<SplitRecord>> {
    prop::collection::vec((0u32..500, any::<bool>()), 0..200).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (minute, valid))| SplitRecord {
                comment_text: Some(format!("row {i}")),
                target: Some(0.5),
                created_date: if valid {
                    format!("2019-05-01 {:02}:{:02}:00", minute / 60, minute % 60)
                } else {
                    "n/a".to_string()
                },
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn split_partitions_filtered_rows(rows in arb_rows(), seed in any::<u64>()) {
        let total = rows.len();
        let valid = rows.iter().filter(|r| r.created_date != "n/a").count();
        let config = SplitConfig { seed, ..Default::default() };
        let (partition, invalid) = split::partition(rows, &config).unwrap();

        prop_assert_eq!(
            partition.train.len() + partition.validation.len() + partition.production.len(),
            valid
        );
        prop_assert_eq!(invalid, total - valid);

        let mut names: Vec<_> = partition
            .train
            .iter()
            .chain(&partition.validation)
            .chain(&partition.production)
            .map(|r| r.comment_text.clone().unwrap())
            .collect();
        names.sort();
        names.dedup();
        prop_assert_eq!(names.len(), valid);
    }
}
