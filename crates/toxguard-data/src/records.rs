//! CSV row types for the comment corpus

use serde::{Deserialize, Serialize};
use std::path::Path;
use toxguard_core::Result;

/// Row of the raw corpus; columns beyond these are ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub comment_text: Option<String>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub severe_toxicity: Option<f64>,
    #[serde(default)]
    pub obscene: Option<f64>,
    #[serde(default)]
    pub identity_attack: Option<f64>,
    #[serde(default)]
    pub insult: Option<f64>,
    #[serde(default)]
    pub threat: Option<f64>,
    #[serde(default)]
    pub sexual_explicit: Option<f64>,
    #[serde(default)]
    pub created_date: Option<String>,
}

/// Nine-column row written by preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedRecord {
    pub comment_text: Option<String>,
    pub target: Option<f64>,
    pub severe_toxicity: Option<f64>,
    pub obscene: Option<f64>,
    pub identity_attack: Option<f64>,
    pub insult: Option<f64>,
    pub threat: Option<f64>,
    pub sexual_explicit: Option<f64>,
    pub created_date: String,
}

/// Three-column row written by the timestamp split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub comment_text: Option<String>,
    pub target: Option<f64>,
    pub created_date: String,
}

/// Read every row of a CSV into `T`
pub fn read_csv<T>(path: &Path) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        toxguard_core::Error::data(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(rows)
}

/// Write rows to a CSV with a header line, creating parent directories
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_record_ignores_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(
            &path,
            "id,target,comment_text,rating,created_date\n1,0.4,hello,approved,2017-01-01\n2,,,rejected,\n",
        )
        .unwrap();

        let rows: Vec<SourceRecord> = read_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].comment_text.as_deref(), Some("hello"));
        assert_eq!(rows[0].target, Some(0.4));
        assert_eq!(rows[0].threat, None);
        assert_eq!(rows[1].target, None);
        assert_eq!(rows[1].created_date, None);
    }

    #[test]
    fn test_prepared_record_header_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/training.csv");
        let row = PreparedRecord {
            comment_text: Some("hi".to_string()),
            target: Some(0.5),
            severe_toxicity: None,
            obscene: Some(0.0),
            identity_attack: Some(0.0),
            insult: Some(0.1),
            threat: Some(0.0),
            sexual_explicit: Some(0.0),
            created_date: "2017-01-01 00:00:00.000000+00:00".to_string(),
        };
        write_csv(&path, &[row]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(
            "comment_text,target,severe_toxicity,obscene,identity_attack,insult,threat,sexual_explicit,created_date\n"
        ));
        assert!(content.contains("hi,0.5,,0.0,"));
    }
}
