pub mod metrics;

pub use metrics::{Metric, MetricsTable, ReviewBucket, Series};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to access dataset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One collected pull request, persisted as a CSV row.
///
/// Field order is the column order of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrRecord {
    /// `owner/name` of the repository
    pub repository: String,
    /// MERGED or CLOSED
    pub final_status: String,
    /// Hours from creation to merge (or close), rounded to two decimals
    pub review_time_hours: f64,
    pub files: u64,
    pub additions: u64,
    pub deletions: u64,
    /// Character count of the description text
    pub description_chars: u64,
    pub participants: u64,
    pub comments: u64,
    pub reviews: u64,
}

/// Write records as CSV with a header row, creating the parent directory.
#[instrument(skip(records), fields(path = %path.display(), records = records.len()))]
pub fn write_records(path: &Path, records: &[PrRecord]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    debug!("dataset written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn sample_record() -> PrRecord {
        PrRecord {
            repository: "octo/widgets".to_string(),
            final_status: "MERGED".to_string(),
            review_time_hours: 26.42,
            files: 4,
            additions: 120,
            deletions: 7,
            description_chars: 311,
            participants: 3,
            comments: 5,
            reviews: 2,
        }
    }

    #[test]
    fn test_header_matches_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prs.csv");
        write_records(&path, &[sample_record()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "repository,final_status,review_time_hours,files,additions,deletions,description_chars,participants,comments,reviews"
        );
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/prs.csv");
        write_records(&path, &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_typed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prs.csv");
        let mut other = sample_record();
        other.repository = "octo/gadgets".to_string();
        other.final_status = "CLOSED".to_string();
        other.review_time_hours = 1.0;
        other.reviews = 11;
        let records = vec![sample_record(), other];
        write_records(&path, &records).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let read: Vec<PrRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_description_with_comma_is_not_a_problem() {
        // Only the repository and status columns are text; quoting is left to the writer
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prs.csv");
        let mut record = sample_record();
        record.repository = "odd,name/repo".to_string();
        write_records(&path, &[record.clone()]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let read: Vec<PrRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(read[0].repository, record.repository);
    }
}
