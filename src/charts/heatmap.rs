use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{debug, instrument};

use super::colormap::{text_color_on, ColorMap};
use super::RenderError;
use crate::analysis::LabeledGrid;

const WIDTH: i32 = 1800;
const HEIGHT: i32 = 1400;
const COLOR_BAR_WIDTH: i32 = 170;
const ROW_LABEL_AREA: i32 = 260;
const COLUMN_LABEL_AREA: i32 = 90;

/// How a heatmap is colored and annotated.
#[derive(Debug, Clone)]
pub struct HeatmapStyle {
    pub title: String,
    pub x_desc: Option<String>,
    pub y_desc: Option<String>,
    pub colors: ColorMap,
    /// Fixed scale limits; the data range is used when unset
    pub limits: Option<(f64, f64)>,
    /// Decimal places of the cell annotations
    pub decimals: usize,
}

/// Draw `grid` as an annotated heatmap with a color bar. Undefined cells are
/// left blank.
#[instrument(skip(grid, style), fields(path = %path.display(), title = %style.title))]
pub fn render(grid: &LabeledGrid, style: &HeatmapStyle, path: &Path) -> Result<(), RenderError> {
    let (min, max) = style
        .limits
        .or_else(|| grid.value_range())
        .unwrap_or((0.0, 1.0));
    let rows = grid.row_labels.len();
    let columns = grid.column_labels.len();

    let root = BitMapBackend::new(path, (WIDTH as u32, HEIGHT as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let titled = root.titled(&style.title, ("sans-serif", 40))?;
    let (plot_area, bar_area) = titled.split_horizontally(WIDTH - COLOR_BAR_WIDTH);

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(20)
        .x_label_area_size(COLUMN_LABEL_AREA)
        .y_label_area_size(ROW_LABEL_AREA)
        .build_cartesian_2d(0f64..columns.max(1) as f64, 0f64..rows.max(1) as f64)?;

    // Row 0 is drawn at the top
    let cell_top = |row: usize| (rows - row) as f64;

    let mut cells = Vec::new();
    let mut annotations = Vec::new();
    let annotation_font = ("sans-serif", 26).into_font();
    for row in 0..rows {
        for column in 0..columns {
            let Some(value) = grid.get(row, column) else {
                continue;
            };
            let color = style.colors.scaled(value, min, max);
            let (x, y) = (column as f64, cell_top(row));
            cells.push(Rectangle::new([(x, y), (x + 1.0, y - 1.0)], color.filled()));
            annotations.push(Text::new(
                format!("{:.*}", style.decimals, value),
                (x + 0.5, y - 0.5),
                annotation_font
                    .color(&text_color_on(color))
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ));
        }
    }
    chart.draw_series(cells)?;
    chart.draw_series(annotations)?;

    // Separators between cells
    let separators = (0..=columns)
        .map(|c| PathElement::new(vec![(c as f64, 0.0), (c as f64, rows as f64)], WHITE.stroke_width(2)))
        .chain((0..=rows).map(|r| {
            PathElement::new(vec![(0.0, r as f64), (columns as f64, r as f64)], WHITE.stroke_width(2))
        }));
    chart.draw_series(separators)?;

    let label_style = TextStyle::from(("sans-serif", 24).into_font());
    for (column, label) in grid.column_labels.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(column as f64 + 0.5, 0.0));
        root.draw(&Text::new(
            label.clone(),
            (px, py + 12),
            label_style.pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }
    for (row, label) in grid.row_labels.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(0.0, cell_top(row) - 0.5));
        root.draw(&Text::new(
            label.clone(),
            (px - 12, py),
            label_style.pos(Pos::new(HPos::Right, VPos::Center)),
        ))?;
    }

    let desc_font = ("sans-serif", 28).into_font();
    let centered_below = Pos::new(HPos::Center, VPos::Bottom);
    if let Some(x_desc) = &style.x_desc {
        let (px, _) = chart.backend_coord(&(columns as f64 / 2.0, 0.0));
        root.draw(&Text::new(
            x_desc.clone(),
            (px, HEIGHT - 20),
            TextStyle::from(desc_font.clone()).pos(centered_below),
        ))?;
    }
    if let Some(y_desc) = &style.y_desc {
        let (_, py) = chart.backend_coord(&(0.0, rows as f64 / 2.0));
        root.draw(&Text::new(
            y_desc.clone(),
            (20, py),
            TextStyle::from(desc_font.transform(FontTransform::Rotate270))
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }

    draw_color_bar(&bar_area, style.colors, min, max)?;

    root.present()?;
    debug!(rows, columns, "heatmap rendered");
    Ok(())
}

fn draw_color_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    colors: ColorMap,
    min: f64,
    max: f64,
) -> Result<(), RenderError>
where
    DB::ErrorType: 'static,
{
    let (min, max) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let mut bar = ChartBuilder::on(area)
        .margin_top(60)
        .margin_bottom(COLUMN_LABEL_AREA + 20)
        .margin_left(10)
        .right_y_label_area_size(90)
        .build_cartesian_2d(0f64..1f64, min..max)?;

    const STEPS: usize = 200;
    let step = (max - min) / STEPS as f64;
    bar.draw_series((0..STEPS).map(|i| {
        let lo = min + step * i as f64;
        let color = colors.scaled(lo + step / 2.0, min, max);
        Rectangle::new([(0.0, lo), (1.0, lo + step)], color.filled())
    }))?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_label_formatter(&|v| format!("{v:.1}"))
        .label_style(("sans-serif", 22))
        .draw()?;
    Ok(())
}
