pub mod stats;

use tracing::debug;

use crate::dataset::{Metric, MetricsTable, ReviewBucket, Series};

/// Hexbin views need at least this many complete pairs to be drawn.
pub const MIN_PAIRED_OBSERVATIONS: usize = 10;

/// A table of optional values with labelled rows and columns, ready to be
/// drawn as a heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledGrid {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `cells[row][column]`; `None` is an undefined value
    pub cells: Vec<Vec<Option<f64>>>,
}

impl LabeledGrid {
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(column).copied().flatten())
    }

    /// Smallest and largest defined values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |range, &v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            })
    }
}

fn metric_labels() -> Vec<String> {
    Metric::ALL.iter().map(|m| m.label().to_string()).collect()
}

/// Pairwise Pearson correlation between every metric, each pair over the
/// rows where both metrics are present.
pub fn correlation_matrix(table: &MetricsTable) -> LabeledGrid {
    let columns: Vec<Vec<Option<f64>>> = Metric::ALL.iter().map(|&m| table.metric(m)).collect();

    let cells = columns
        .iter()
        .map(|xs| {
            columns
                .iter()
                .map(|ys| {
                    let (x, y) = stats::complete_pairs(xs, ys);
                    stats::pearson(&x, &y)
                })
                .collect()
        })
        .collect();

    LabeledGrid {
        row_labels: metric_labels(),
        column_labels: metric_labels(),
        cells,
    }
}

fn group_means(table: &MetricsTable, groups: &[String], membership: &[Option<usize>]) -> Vec<Vec<Option<f64>>> {
    let columns: Vec<Vec<Option<f64>>> = Metric::ALL.iter().map(|&m| table.metric(m)).collect();

    (0..groups.len())
        .map(|group| {
            columns
                .iter()
                .map(|column| {
                    let members = column
                        .iter()
                        .zip(membership)
                        .filter(|(_, g)| **g == Some(group))
                        .map(|(v, _)| *v);
                    stats::mean(members).map(|m| stats::round_to(m, 2))
                })
                .collect()
        })
        .collect()
}

/// Mean of every metric per final status (one row per status, sorted).
pub fn means_by_status(table: &MetricsTable) -> LabeledGrid {
    let statuses = table.statuses();
    let membership: Vec<Option<usize>> = table
        .rows()
        .iter()
        .map(|row| statuses.iter().position(|s| *s == row.final_status))
        .collect();

    let cells = group_means(table, &statuses, &membership);
    debug!(groups = statuses.len(), "computed means by status");
    LabeledGrid {
        row_labels: statuses,
        column_labels: metric_labels(),
        cells,
    }
}

/// Mean of every metric per review-count bucket. All buckets are listed;
/// an empty bucket has no values.
pub fn means_by_review_bucket(table: &MetricsTable) -> LabeledGrid {
    let labels: Vec<String> = ReviewBucket::ALL.iter().map(|b| b.label().to_string()).collect();
    let membership: Vec<Option<usize>> = table
        .review_buckets()
        .into_iter()
        .map(|bucket| bucket.and_then(|b| ReviewBucket::ALL.iter().position(|x| *x == b)))
        .collect();

    let cells = group_means(table, &labels, &membership);
    LabeledGrid {
        row_labels: labels,
        column_labels: metric_labels(),
        cells,
    }
}

/// A pair of series drawn as a hexbin joint plot.
#[derive(Debug, Clone, Copy)]
pub struct HexbinView {
    /// File stem of the rendered image
    pub name: &'static str,
    pub title: &'static str,
    pub x: Series,
    pub x_label: &'static str,
    pub y: Series,
    pub y_label: &'static str,
}

const OUTCOME: &str = "Final outcome (code)";
const REVIEWS: &str = "Number of reviews";

pub const HEXBIN_VIEWS: [HexbinView; 8] = [
    HexbinView {
        name: "rq01_size_vs_outcome",
        title: "RQ01 - PR size vs final outcome",
        x: Series::Metric(Metric::TotalLines),
        x_label: "Total size (lines)",
        y: Series::StatusCode,
        y_label: OUTCOME,
    },
    HexbinView {
        name: "rq02_time_vs_outcome",
        title: "RQ02 - Review time vs final outcome",
        x: Series::Metric(Metric::ReviewHours),
        x_label: "Review time (h)",
        y: Series::StatusCode,
        y_label: OUTCOME,
    },
    HexbinView {
        name: "rq03_description_vs_outcome",
        title: "RQ03 - Description length vs final outcome",
        x: Series::Metric(Metric::DescriptionLength),
        x_label: "Description length (chars)",
        y: Series::StatusCode,
        y_label: OUTCOME,
    },
    HexbinView {
        name: "rq04_interactions_vs_outcome",
        title: "RQ04 - Interactions vs final outcome",
        x: Series::Metric(Metric::Comments),
        x_label: "Interactions (comments)",
        y: Series::StatusCode,
        y_label: OUTCOME,
    },
    HexbinView {
        name: "rq05_size_vs_reviews",
        title: "RQ05 - PR size vs number of reviews",
        x: Series::Metric(Metric::TotalLines),
        x_label: "Total size (lines)",
        y: Series::Metric(Metric::Reviews),
        y_label: REVIEWS,
    },
    HexbinView {
        name: "rq06_time_vs_reviews",
        title: "RQ06 - Review time vs number of reviews",
        x: Series::Metric(Metric::ReviewHours),
        x_label: "Review time (h)",
        y: Series::Metric(Metric::Reviews),
        y_label: REVIEWS,
    },
    HexbinView {
        name: "rq07_description_vs_reviews",
        title: "RQ07 - Description length vs number of reviews",
        x: Series::Metric(Metric::DescriptionLength),
        x_label: "Description length (chars)",
        y: Series::Metric(Metric::Reviews),
        y_label: REVIEWS,
    },
    HexbinView {
        name: "rq08_interactions_vs_reviews",
        title: "RQ08 - Interactions vs number of reviews",
        x: Series::Metric(Metric::Comments),
        x_label: "Interactions (comments)",
        y: Series::Metric(Metric::Reviews),
        y_label: REVIEWS,
    },
];

/// Complete observations of a view's two series with their correlations.
#[derive(Debug, Clone)]
pub struct PairedSample {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub pearson: Option<f64>,
    pub spearman: Option<f64>,
}

impl PairedSample {
    pub fn len(&self) -> usize {
        self.xs.len()
    }
}

/// Collect the complete pairs for `view`, or `None` when there are fewer
/// than [`MIN_PAIRED_OBSERVATIONS`].
pub fn paired_sample(table: &MetricsTable, view: &HexbinView) -> Option<PairedSample> {
    let (xs, ys) = stats::complete_pairs(&table.series(view.x), &table.series(view.y));
    if xs.len() < MIN_PAIRED_OBSERVATIONS {
        debug!(view = view.name, pairs = xs.len(), "not enough complete pairs");
        return None;
    }

    let pearson = stats::pearson(&xs, &ys);
    let spearman = stats::spearman(&xs, &ys);
    Some(PairedSample {
        xs,
        ys,
        pearson,
        spearman,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../../tests/fixtures/pull_requests.csv");

    fn fixture() -> MetricsTable {
        MetricsTable::from_reader(FIXTURE.as_bytes()).unwrap()
    }

    fn column(metric: Metric) -> usize {
        Metric::ALL.iter().position(|m| *m == metric).unwrap()
    }

    #[test]
    fn test_correlation_matrix_shape_and_diagonal() {
        let matrix = correlation_matrix(&fixture());
        assert_eq!(matrix.row_labels.len(), 7);
        assert_eq!(matrix.column_labels.len(), 7);
        for i in 0..7 {
            let diagonal = matrix.get(i, i).unwrap();
            assert!((diagonal - 1.0).abs() < 1e-9);
            for j in 0..7 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        // Bigger PRs draw more comments in the fixture
        let size_comments = matrix.get(column(Metric::TotalLines), column(Metric::Comments)).unwrap();
        assert!(size_comments > 0.9);
    }

    #[test]
    fn test_all_missing_column_is_undefined_not_an_error() {
        let csv = "repository,final_status,review_time_hours,files,additions,deletions,reviews\n\
                   a/b,MERGED,2.0,,1,1,1\n\
                   a/b,CLOSED,3.0,,5,0,2\n\
                   a/b,MERGED,9.0,,7,2,4\n";
        let table = MetricsTable::from_reader(csv.as_bytes()).unwrap();
        let matrix = correlation_matrix(&table);

        let files = column(Metric::Files);
        for j in 0..7 {
            assert_eq!(matrix.get(files, j), None);
            assert_eq!(matrix.get(j, files), None);
        }
        assert!(matrix
            .get(column(Metric::ReviewHours), column(Metric::Reviews))
            .is_some());
    }

    #[test]
    fn test_means_by_status() {
        let means = means_by_status(&fixture());
        assert_eq!(means.row_labels, vec!["closed", "merged"]);
        assert_eq!(means.get(0, column(Metric::Reviews)), Some(6.0));
        assert_eq!(means.get(0, column(Metric::Files)), Some(17.75));
        // the unparseable file count is left out of the merged mean
        assert_eq!(means.get(1, column(Metric::Files)), Some(4.43));
    }

    #[test]
    fn test_means_by_review_bucket() {
        let means = means_by_review_bucket(&fixture());
        assert_eq!(means.row_labels, vec!["1", "2-3", "4-5", "6-10", "10+"]);
        assert_eq!(means.get(0, column(Metric::TotalLines)), Some(28.0));
        assert_eq!(means.get(0, column(Metric::Reviews)), Some(1.0));
        assert_eq!(means.get(3, column(Metric::Reviews)), Some(7.0));
        assert_eq!(means.get(4, column(Metric::Reviews)), Some(12.0));
    }

    #[test]
    fn test_empty_bucket_has_no_means() {
        let csv = "final_status,reviews,comments\nMERGED,1,3\nCLOSED,2,4\n";
        let table = MetricsTable::from_reader(csv.as_bytes()).unwrap();
        let means = means_by_review_bucket(&table);
        assert_eq!(means.cells.len(), 5);
        assert!(means.cells[4].iter().all(Option::is_none));
        assert_eq!(means.get(0, column(Metric::Comments)), Some(3.0));
    }

    #[test]
    fn test_value_range() {
        let grid = LabeledGrid {
            row_labels: vec!["a".into()],
            column_labels: vec!["x".into(), "y".into(), "z".into()],
            cells: vec![vec![Some(2.0), None, Some(-1.5)]],
        };
        assert_eq!(grid.value_range(), Some((-1.5, 2.0)));

        let empty = LabeledGrid {
            row_labels: vec![],
            column_labels: vec![],
            cells: vec![],
        };
        assert_eq!(empty.value_range(), None);
    }

    #[test]
    fn test_paired_sample_for_every_view_on_fixture() {
        let table = fixture();
        for view in &HEXBIN_VIEWS {
            let sample = paired_sample(&table, view).unwrap();
            assert_eq!(sample.len(), 12, "{}", view.name);
            assert!(sample.pearson.is_some());
            assert!(sample.spearman.is_some());
        }
    }

    #[test]
    fn test_paired_sample_needs_ten_pairs() {
        let mut csv = String::from("final_status,additions,deletions,reviews\n");
        for i in 0..9 {
            csv.push_str(&format!("MERGED,{},0,{}\n", i * 10, i + 1));
        }
        let table = MetricsTable::from_reader(csv.as_bytes()).unwrap();
        assert!(paired_sample(&table, &HEXBIN_VIEWS[4]).is_none());

        csv.push_str("CLOSED,500,10,3\n");
        let table = MetricsTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(paired_sample(&table, &HEXBIN_VIEWS[4]).unwrap().len(), 10);
    }
}
