//! Missing-data plots: nullity matrix, present-count bars, column dendrogram
//! and nullity-correlation heatmap, laid out 2x2 in one PNG.
//!
//! Each panel is a `ChartBuilder` chart with a caption and column-name labels.
//! Text needs a system font; without one the shapes are still drawn and the
//! missing labels are logged.

use crate::analysis::missing::MissingSummary;
use crate::config::RenderConfig;
use crate::error::{EdaError, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

const PRESENT: RGBColor = RGBColor(64, 64, 64);
const BAR: RGBColor = RGBColor(70, 110, 160);
const LINK: RGBColor = RGBColor(40, 40, 40);
const NO_DATA: RGBColor = RGBColor(235, 235, 235);
const FONT: &str = "sans-serif";

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn render_err(e: impl std::fmt::Display) -> EdaError {
    EdaError::Render(e.to_string())
}

/// Draw the four missing-data plots into `path`
pub fn render_missing_plots(summary: &MissingSummary, path: &Path, size: &RenderConfig) -> Result<()> {
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let panels = root.split_evenly((2, 2));
    draw_matrix(&panels[0], summary)?;
    draw_bars(&panels[1], summary)?;
    draw_dendrogram(&panels[2], summary)?;
    draw_heatmap(&panels[3], summary)?;

    root.present().map_err(render_err)?;
    debug!("Rendered missing-data plots to {}", path.display());
    Ok(())
}

/// Chart over `panel`, captioned when a font is available. Column `i` is
/// centred on `x = i`.
fn chart_on<'a, 'b>(
    panel: &'a Panel<'b>,
    title: &str,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, 'b>> {
    let (width, height) = panel.dim_in_pixel();
    // Rotated column names hang below the plot
    let label_area = (height / 4).min(160);
    let value_area = (width / 8).min(50);

    let captioned = ChartBuilder::on(panel)
        .caption(title, (FONT, 20))
        .margin(5)
        .x_label_area_size(label_area)
        .y_label_area_size(value_area)
        .build_cartesian_2d(x.clone(), y.clone());
    match captioned {
        Ok(chart) => Ok(chart),
        Err(e) => {
            warn!(panel = title, "Drawing without caption: {}", e);
            ChartBuilder::on(panel)
                .margin(5)
                .x_label_area_size(label_area)
                .y_label_area_size(value_area)
                .build_cartesian_2d(x, y)
                .map_err(render_err)
        }
    }
}

fn column_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Name at an integer tick; empty between ticks and out of range
fn label_at(names: &[&str], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    names.get(i as usize).map(|n| n.to_string()).unwrap_or_default()
}

fn rotated_labels() -> TextStyle<'static> {
    (FONT, 12).into_font().transform(FontTransform::Rotate90).into()
}

fn text_drawn(panel: &str, result: std::result::Result<(), impl std::fmt::Display>) {
    if let Err(e) = result {
        warn!(panel, "Plot labels skipped: {}", e);
    }
}

fn draw_matrix(panel: &Panel, summary: &MissingSummary) -> Result<()> {
    let cols = summary.column_count();
    let rows = summary.row_count;
    let names: Vec<&str> = summary.columns.iter().map(String::as_str).collect();
    let top = rows.max(1) as f64;
    let mut chart = chart_on(panel, "Nullity matrix", column_range(cols), 0.0..top)?;

    // Row 0 at the top; runs of present cells become one rectangle
    let mut runs = Vec::new();
    for c in 0..cols {
        let mut r = 0;
        while r < rows {
            if !summary.present[r][c] {
                r += 1;
                continue;
            }
            let start = r;
            while r < rows && summary.present[r][c] {
                r += 1;
            }
            let x = c as f64;
            runs.push(Rectangle::new(
                [(x - 0.45, top - start as f64), (x + 0.45, top - r as f64)],
                PRESENT.filled(),
            ));
        }
    }
    chart.draw_series(runs).map_err(render_err)?;

    let labels = chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols.max(1))
        .x_label_formatter(&|x| label_at(&names, *x))
        .x_label_style(rotated_labels())
        .y_label_formatter(&|y| format!("{:.0}", top - y))
        .y_desc("Row")
        .draw();
    text_drawn("matrix", labels);
    Ok(())
}

fn draw_bars(panel: &Panel, summary: &MissingSummary) -> Result<()> {
    let cols = summary.column_count();
    let names: Vec<&str> = summary.columns.iter().map(String::as_str).collect();
    let mut chart = chart_on(panel, "Present values", column_range(cols), 0.0..1.0)?;

    if summary.row_count > 0 {
        let bars = summary.present_counts.iter().enumerate().map(|(c, &count)| {
            let x = c as f64;
            let fraction = count as f64 / summary.row_count as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, fraction)], BAR.filled())
        });
        chart.draw_series(bars).map_err(render_err)?;
    }

    let labels = chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(cols.max(1))
        .x_label_formatter(&|x| label_at(&names, *x))
        .x_label_style(rotated_labels())
        .y_desc("Fraction present")
        .draw();
    text_drawn("bars", labels);
    Ok(())
}

fn draw_dendrogram(panel: &Panel, summary: &MissingSummary) -> Result<()> {
    let tree = &summary.dendrogram;
    let n = summary.column_count();
    let max_distance = tree
        .merges
        .iter()
        .map(|m| m.distance)
        .fold(0.0_f64, f64::max);
    let height = if max_distance > 0.0 { max_distance * 1.05 } else { 1.0 };
    let mut chart = chart_on(panel, "Nullity dendrogram", column_range(n), 0.0..height)?;

    // (x, y) of every node: leaves first, then one per merge
    let mut nodes: Vec<(f64, f64)> = vec![(0.0, 0.0); n + tree.merges.len()];
    for (position, &leaf) in tree.leaf_order.iter().enumerate() {
        nodes[leaf] = (position as f64, 0.0);
    }
    let style = ShapeStyle::from(&LINK).stroke_width(2);
    let mut links = Vec::with_capacity(tree.merges.len());
    for (k, merge) in tree.merges.iter().enumerate() {
        let (lx, ly) = nodes[merge.left];
        let (rx, ry) = nodes[merge.right];
        let y = merge.distance;
        links.push(PathElement::new(vec![(lx, ly), (lx, y), (rx, y), (rx, ry)], style));
        nodes[n + k] = ((lx + rx) / 2.0, y);
    }
    chart.draw_series(links).map_err(render_err)?;

    let leaves: Vec<&str> = tree
        .leaf_order
        .iter()
        .map(|&leaf| summary.columns[leaf].as_str())
        .collect();
    let labels = chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&|x| label_at(&leaves, *x))
        .x_label_style(rotated_labels())
        .y_desc("Distance")
        .draw();
    text_drawn("dendrogram", labels);
    Ok(())
}

fn draw_heatmap(panel: &Panel, summary: &MissingSummary) -> Result<()> {
    // Only partially missing columns carry a correlation
    let partial: Vec<usize> = (0..summary.column_count())
        .filter(|&c| summary.is_partial(c))
        .collect();
    let n = partial.len();
    let names: Vec<&str> = partial.iter().map(|&c| summary.columns[c].as_str()).collect();
    // First column at the top of the y axis
    let rows_top_down: Vec<&str> = names.iter().rev().copied().collect();
    let mut chart = chart_on(panel, "Nullity correlation", column_range(n), column_range(n))?;

    let mut cells = Vec::new();
    for (i, &a) in partial.iter().enumerate() {
        let y = (n - 1 - i) as f64;
        // Lower triangle, diagonal excluded
        for (j, &b) in partial.iter().enumerate().take(i) {
            let color = match summary.correlation[a][b] {
                Some(value) => diverging(value),
                None => NO_DATA,
            };
            let x = j as f64;
            cells.push(Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                color.filled(),
            ));
        }
    }
    chart.draw_series(cells).map_err(render_err)?;

    let labels = chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n.max(1))
        .y_labels(n.max(1))
        .x_label_formatter(&|x| label_at(&names, *x))
        .y_label_formatter(&|y| label_at(&rows_top_down, *y))
        .x_label_style(rotated_labels())
        .draw();
    text_drawn("heatmap", labels);
    Ok(())
}

/// Map -1..1 onto blue..white..red
fn diverging(value: f64) -> RGBColor {
    let v = value.clamp(-1.0, 1.0);
    let fade = |full: u8, t: f64| -> u8 { (255.0 - (255.0 - full as f64) * t).round() as u8 };
    if v >= 0.0 {
        RGBColor(fade(178, v), fade(24, v), fade(43, v))
    } else {
        let t = -v;
        RGBColor(fade(33, t), fade(102, t), fade(172, t))
    }
}
