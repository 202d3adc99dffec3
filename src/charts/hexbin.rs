use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;
use tracing::{debug, instrument};

use super::colormap::{ROYAL_BLUE, ROYAL_BLUE_DENSITY};
use super::RenderError;
use crate::analysis::{HexbinView, PairedSample};

/// Hexagons across the x axis.
pub const GRID_SIZE: usize = 35;
const HISTOGRAM_BINS: usize = 30;

const SIZE: i32 = 1400;
const MARGINAL: i32 = 220;
const X_LABEL_AREA: i32 = 80;
const Y_LABEL_AREA: i32 = 100;

/// A non-empty hexagon and how many points fell into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexCell {
    pub x: f64,
    pub y: f64,
    pub count: u32,
}

/// Points binned onto two interleaved rectangular lattices of hexagon
/// centers, `GRID_SIZE` columns wide.
#[derive(Debug, Clone)]
pub struct HexGrid {
    pub cells: Vec<HexCell>,
    /// Horizontal distance between centers on one lattice
    pub sx: f64,
    /// Vertical distance between centers on one lattice
    pub sy: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

fn extent(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi > lo {
        return (lo, hi);
    }
    let delta = if lo == 0.0 { 0.5 } else { lo.abs() * 0.05 };
    (lo - delta, hi + delta)
}

impl HexGrid {
    pub fn bin(xs: &[f64], ys: &[f64], grid_size: usize) -> Self {
        let nx = grid_size.max(1) as f64;
        let ny = (nx / 3f64.sqrt()).floor().max(1.0);

        let (mut x_min, mut x_max) = extent(xs);
        let (y_min, y_max) = extent(ys);
        let padding = 1e-9 * (x_max - x_min);
        x_min -= padding;
        x_max += padding;

        let sx = (x_max - x_min) / nx;
        let sy = (y_max - y_min) / ny;

        // (offset lattice?, column, row) -> count
        let mut counts: BTreeMap<(bool, i64, i64), u32> = BTreeMap::new();
        for (&px, &py) in xs.iter().zip(ys) {
            let x = (px - x_min) / sx;
            let y = (py - y_min) / sy;
            let (ix1, iy1) = (x.round(), y.round());
            let (ix2, iy2) = (x.floor(), y.floor());
            let d1 = (x - ix1).powi(2) + 3.0 * (y - iy1).powi(2);
            let d2 = (x - ix2 - 0.5).powi(2) + 3.0 * (y - iy2 - 0.5).powi(2);
            let key = if d1 < d2 {
                (false, ix1 as i64, iy1 as i64)
            } else {
                (true, ix2 as i64, iy2 as i64)
            };
            *counts.entry(key).or_insert(0) += 1;
        }

        let cells = counts
            .into_iter()
            .map(|((offset, i, j), count)| {
                let shift = if offset { 0.5 } else { 0.0 };
                HexCell {
                    x: x_min + (i as f64 + shift) * sx,
                    y: y_min + (j as f64 + shift) * sy,
                    count,
                }
            })
            .collect();

        Self {
            cells,
            sx,
            sy,
            x_range: (x_min, x_max),
            y_range: (y_min, y_max),
        }
    }

    pub fn max_count(&self) -> u32 {
        self.cells.iter().map(|c| c.count).max().unwrap_or(0)
    }

    /// Corners of the hexagon centered on `cell`.
    pub fn vertices(&self, cell: &HexCell) -> Vec<(f64, f64)> {
        const OFFSETS: [(f64, f64); 6] = [
            (0.5, -0.5),
            (0.5, 0.5),
            (0.0, 1.0),
            (-0.5, 0.5),
            (-0.5, -0.5),
            (0.0, -1.0),
        ];
        OFFSETS
            .iter()
            .map(|(dx, dy)| (cell.x + dx * self.sx, cell.y + dy * self.sy / 3.0))
            .collect()
    }
}

/// Counts of `values` in `bins` equal-width bins over `[lo, hi]`.
pub fn histogram(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<u32> {
    let mut counts = vec![0; bins.max(1)];
    let width = (hi - lo) / counts.len() as f64;
    for &v in values {
        if !(lo..=hi).contains(&v) || width <= 0.0 {
            continue;
        }
        let index = (((v - lo) / width) as usize).min(counts.len() - 1);
        counts[index] += 1;
    }
    counts
}

fn format_coefficient(value: Option<f64>) -> String {
    value.map_or_else(|| "nan".to_string(), |v| format!("{v:.2}"))
}

/// Subtitle with both correlation coefficients, e.g. `Pearson=0.41 | Spearman=0.37`.
pub fn correlation_caption(sample: &PairedSample) -> String {
    format!(
        "Pearson={} | Spearman={}",
        format_coefficient(sample.pearson),
        format_coefficient(sample.spearman)
    )
}

/// Draw a hexbin joint plot of `sample` with marginal histograms.
#[instrument(skip(sample, view), fields(view = view.name, pairs = sample.len()))]
pub fn render(sample: &PairedSample, view: &HexbinView, path: &Path) -> Result<(), RenderError> {
    let grid = HexGrid::bin(&sample.xs, &sample.ys, GRID_SIZE);
    let x_span = (grid.x_range.0 - grid.sx, grid.x_range.1 + grid.sx);
    let y_span = (grid.y_range.0 - grid.sy, grid.y_range.1 + grid.sy);

    let root = BitMapBackend::new(path, (SIZE as u32, SIZE as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root
        .titled(view.title, ("sans-serif", 36))?
        .titled(&correlation_caption(sample), ("sans-serif", 28))?;

    let (width, _) = area.dim_in_pixel();
    let (top, bottom) = area.split_vertically(MARGINAL);
    let (top_histogram, _) = top.split_horizontally(width as i32 - MARGINAL);
    let (main, right_histogram) = bottom.split_horizontally(width as i32 - MARGINAL);

    let mut chart = ChartBuilder::on(&main)
        .margin(10)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_span.0..x_span.1, y_span.0..y_span.1)?;
    chart
        .configure_mesh()
        .x_desc(view.x_label)
        .y_desc(view.y_label)
        .label_style(("sans-serif", 20))
        .axis_desc_style(("sans-serif", 26))
        .draw()?;

    let max_count = grid.max_count() as f64;
    chart.draw_series(grid.cells.iter().map(|cell| {
        let color = ROYAL_BLUE_DENSITY.scaled(cell.count as f64, 0.0, max_count);
        Polygon::new(grid.vertices(cell), color.filled())
    }))?;

    let bar_style = ROYAL_BLUE.mix(0.6).filled();

    let x_counts = histogram(&sample.xs, x_span.0, x_span.1, HISTOGRAM_BINS);
    let x_peak = x_counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let x_width = (x_span.1 - x_span.0) / HISTOGRAM_BINS as f64;
    let mut top_chart = ChartBuilder::on(&top_histogram)
        .margin(10)
        .margin_bottom(0)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_span.0..x_span.1, 0f64..x_peak * 1.05)?;
    top_chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(3)
        .label_style(("sans-serif", 18))
        .draw()?;
    top_chart.draw_series(x_counts.iter().enumerate().map(|(i, &count)| {
        let lo = x_span.0 + x_width * i as f64;
        Rectangle::new([(lo, 0.0), (lo + x_width, count as f64)], bar_style)
    }))?;

    let y_counts = histogram(&sample.ys, y_span.0, y_span.1, HISTOGRAM_BINS);
    let y_peak = y_counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let y_width = (y_span.1 - y_span.0) / HISTOGRAM_BINS as f64;
    let mut right_chart = ChartBuilder::on(&right_histogram)
        .margin(10)
        .margin_left(0)
        .x_label_area_size(X_LABEL_AREA)
        .build_cartesian_2d(0f64..y_peak * 1.05, y_span.0..y_span.1)?;
    right_chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(3)
        .label_style(("sans-serif", 18))
        .draw()?;
    right_chart.draw_series(y_counts.iter().enumerate().map(|(i, &count)| {
        let lo = y_span.0 + y_width * i as f64;
        Rectangle::new([(0.0, lo), (count as f64, lo + y_width)], bar_style)
    }))?;

    root.present()?;
    debug!(hexagons = grid.cells.len(), "hexbin rendered");
    Ok(())
}
