use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::Path;

use tracing::{debug, instrument, warn};

use super::DatasetError;

/// Metrics shown in every chart, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Files,
    TotalLines,
    ReviewHours,
    DescriptionLength,
    Participants,
    Comments,
    Reviews,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Files,
        Metric::TotalLines,
        Metric::ReviewHours,
        Metric::DescriptionLength,
        Metric::Participants,
        Metric::Comments,
        Metric::Reviews,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Files => "Files",
            Metric::TotalLines => "Total lines",
            Metric::ReviewHours => "Review time (h)",
            Metric::DescriptionLength => "Description length",
            Metric::Participants => "Participants",
            Metric::Comments => "Comments",
            Metric::Reviews => "Reviews",
        }
    }

    fn value(self, row: &MetricRow) -> Option<f64> {
        match self {
            Metric::Files => row.files,
            Metric::TotalLines => Some(row.total_lines),
            Metric::ReviewHours => row.review_time_hours,
            Metric::DescriptionLength => row.description_chars,
            Metric::Participants => row.participants,
            Metric::Comments => row.comments,
            Metric::Reviews => row.reviews,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A plottable column: a metric or the numeric code of the final status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Metric(Metric),
    StatusCode,
}

/// Review-count ranges used to group pull requests.
///
/// Edges are 0, 1, 3, 5, 10 and 100, each range closed on the right, with 0
/// itself folded into the first range. Counts outside 0..=100 have no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewBucket {
    One,
    TwoToThree,
    FourToFive,
    SixToTen,
    MoreThanTen,
}

impl ReviewBucket {
    pub const ALL: [ReviewBucket; 5] = [
        ReviewBucket::One,
        ReviewBucket::TwoToThree,
        ReviewBucket::FourToFive,
        ReviewBucket::SixToTen,
        ReviewBucket::MoreThanTen,
    ];

    pub fn from_count(reviews: f64) -> Option<Self> {
        if !(0.0..=100.0).contains(&reviews) {
            return None;
        }
        let bucket = if reviews <= 1.0 {
            ReviewBucket::One
        } else if reviews <= 3.0 {
            ReviewBucket::TwoToThree
        } else if reviews <= 5.0 {
            ReviewBucket::FourToFive
        } else if reviews <= 10.0 {
            ReviewBucket::SixToTen
        } else {
            ReviewBucket::MoreThanTen
        };
        Some(bucket)
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewBucket::One => "1",
            ReviewBucket::TwoToThree => "2-3",
            ReviewBucket::FourToFive => "4-5",
            ReviewBucket::SixToTen => "6-10",
            ReviewBucket::MoreThanTen => "10+",
        }
    }
}

impl fmt::Display for ReviewBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One CSV row after numeric coercion. Unparseable cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    /// Lower-cased final status
    pub final_status: String,
    pub review_time_hours: Option<f64>,
    pub files: Option<f64>,
    /// additions + deletions, missing sides counted as zero
    pub total_lines: f64,
    pub description_chars: Option<f64>,
    pub participants: Option<f64>,
    pub comments: Option<f64>,
    pub reviews: Option<f64>,
}

/// In-memory table the chart commands aggregate over.
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    rows: Vec<MetricRow>,
}

/// Parse a cell as a finite number; anything else is missing.
fn coerce(cell: Option<&str>) -> Option<f64> {
    cell.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl MetricsTable {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a CSV table by header name. Missing columns read as all-missing.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| {
            let index = headers.iter().position(|h| h.trim() == name);
            if index.is_none() {
                warn!(column = name, "column missing from dataset, treating as empty");
            }
            index
        };

        let status = column("final_status");
        let hours = column("review_time_hours");
        let files = column("files");
        let additions = column("additions");
        let deletions = column("deletions");
        let description = column("description_chars");
        let participants = column("participants");
        let comments = column("comments");
        let reviews = column("reviews");

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let text = |index: Option<usize>| index.and_then(|i| record.get(i));
            let number = |index: Option<usize>| coerce(text(index));

            let added = number(additions);
            let removed = number(deletions);
            let final_status = match text(status).map(str::trim) {
                Some(s) if !s.is_empty() => s.to_lowercase(),
                _ => "unknown".to_string(),
            };

            rows.push(MetricRow {
                final_status,
                review_time_hours: number(hours),
                files: number(files),
                total_lines: added.unwrap_or(0.0) + removed.unwrap_or(0.0),
                description_chars: number(description),
                participants: number(participants),
                comments: number(comments),
                reviews: number(reviews),
            });
        }

        debug!(rows = rows.len(), "dataset loaded");
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric(&self, metric: Metric) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| metric.value(row)).collect()
    }

    /// Column values for any plottable series.
    pub fn series(&self, series: Series) -> Vec<Option<f64>> {
        match series {
            Series::Metric(metric) => self.metric(metric),
            Series::StatusCode => self.status_codes(),
        }
    }

    /// Distinct final statuses in sorted order.
    pub fn statuses(&self) -> Vec<String> {
        let distinct: BTreeSet<&str> = self.rows.iter().map(|r| r.final_status.as_str()).collect();
        distinct.into_iter().map(str::to_string).collect()
    }

    /// Each row's status as its index among the sorted distinct statuses,
    /// so `closed` plots below `merged`.
    pub fn status_codes(&self) -> Vec<Option<f64>> {
        let statuses = self.statuses();
        self.rows
            .iter()
            .map(|row| {
                statuses
                    .iter()
                    .position(|s| *s == row.final_status)
                    .map(|i| i as f64)
            })
            .collect()
    }

    pub fn review_buckets(&self) -> Vec<Option<ReviewBucket>> {
        self.rows
            .iter()
            .map(|row| row.reviews.and_then(ReviewBucket::from_count))
            .collect()
    }
}
