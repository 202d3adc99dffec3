pub mod colormap;
pub mod heatmap;
pub mod hexbin;

use std::fs;
use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::analysis::{self, HEXBIN_VIEWS};
use crate::dataset::MetricsTable;
use heatmap::HeatmapStyle;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to create output directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

/// What a chart command produced.
#[derive(Debug, Default)]
pub struct RenderSummary {
    pub written: Vec<PathBuf>,
    /// Views left out for lack of data
    pub skipped: Vec<&'static str>,
    /// Views whose drawing failed
    pub failed: Vec<&'static str>,
}

fn output_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.png"))
}

/// Render the correlation heatmap and the two grouped-mean heatmaps into
/// `dir`, creating it if needed. A failed image is logged and skipped.
#[instrument(skip(table), fields(rows = table.len(), dir = %dir.display()))]
pub fn render_heatmaps(table: &MetricsTable, dir: &Path) -> Result<RenderSummary, RenderError> {
    fs::create_dir_all(dir)?;

    let views: [(&'static str, analysis::LabeledGrid, HeatmapStyle); 3] = [
        (
            "correlation_matrix",
            analysis::correlation_matrix(table),
            HeatmapStyle {
                title: "Correlation between pull request metrics (Pearson)".to_string(),
                x_desc: None,
                y_desc: None,
                colors: colormap::COOLWARM,
                limits: Some((-1.0, 1.0)),
                decimals: 2,
            },
        ),
        (
            "means_by_status",
            analysis::means_by_status(table),
            HeatmapStyle {
                title: "Metric means by final status".to_string(),
                x_desc: Some("Metrics".to_string()),
                y_desc: Some("Final status".to_string()),
                colors: colormap::YL_GN_BU,
                limits: None,
                decimals: 1,
            },
        ),
        (
            "means_by_review_bucket",
            analysis::means_by_review_bucket(table),
            HeatmapStyle {
                title: "Metric means by number of reviews".to_string(),
                x_desc: Some("Metrics".to_string()),
                y_desc: Some("Reviews".to_string()),
                colors: colormap::OR_RD,
                limits: None,
                decimals: 1,
            },
        ),
    ];

    let mut summary = RenderSummary::default();
    for (name, grid, style) in &views {
        let name = *name;
        let path = output_path(dir, name);
        match heatmap::render(grid, style, &path) {
            Ok(()) => {
                info!(path = %path.display(), "heatmap saved");
                summary.written.push(path);
            }
            Err(e) => {
                error!(view = name, error = %e, "failed to render heatmap");
                summary.failed.push(name);
            }
        }
    }
    Ok(summary)
}

/// Render every hexbin view with enough complete pairs into `dir`.
#[instrument(skip(table), fields(rows = table.len(), dir = %dir.display()))]
pub fn render_hexbins(table: &MetricsTable, dir: &Path) -> Result<RenderSummary, RenderError> {
    fs::create_dir_all(dir)?;

    let mut summary = RenderSummary::default();
    for view in &HEXBIN_VIEWS {
        let Some(sample) = analysis::paired_sample(table, view) else {
            warn!(view = view.name, title = view.title, "too few complete pairs, skipping");
            summary.skipped.push(view.name);
            continue;
        };

        let path = output_path(dir, view.name);
        match hexbin::render(&sample, view, &path) {
            Ok(()) => {
                info!(path = %path.display(), caption = %hexbin::correlation_caption(&sample), "hexbin saved");
                summary.written.push(path);
            }
            Err(e) => {
                error!(view = view.name, error = %e, "failed to render hexbin");
                summary.failed.push(view.name);
            }
        }
    }
    Ok(summary)
}
