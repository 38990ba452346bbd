//! Frequency bar charts for single questions.

use super::{bar_gradient, draw_wrapped_labels, wrap_label, Canvas, Figure, FONT, ZERO_BAR, ZERO_EDGE};
use crate::config::ChartConfig;
use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use std::path::{Path, PathBuf};

/// Vertical bar chart of category counts, drawn in the given order.
pub fn draw_frequency_bars(
    path: &Path,
    title: &str,
    ordered: &[(String, usize)],
    config: &ChartConfig,
) -> Result<PathBuf> {
    Figure::new(path, config.bar_size)
        .render(|root| draw_bars(root, title, ordered, config.wrap_width))
}

fn draw_bars(root: &Canvas<'_>, title: &str, ordered: &[(String, usize)], wrap_width: usize) -> Result<()> {
    let n = ordered.len().max(1);
    let max = ordered.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1) as f64;
    let y_top = max * 1.15;

    let label_lines = ordered
        .iter()
        .map(|(label, _)| wrap_label(label, wrap_width).len())
        .max()
        .unwrap_or(1) as u32;

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 22).into_font().style(FontStyle::Bold))
        .margin(20)
        .x_label_area_size(50 + 15 * label_lines)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..n as f64, 0f64..y_top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .x_desc("Response Options")
        .y_desc("Frequency")
        .axis_desc_style((FONT, 16).into_font().style(FontStyle::Bold))
        .draw()?;

    let colors = bar_gradient(ordered.len());
    let value_style = (FONT, 14)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));

    for (i, ((_, count), color)) in ordered.iter().zip(colors).enumerate() {
        let left = i as f64 + 0.15;
        let right = i as f64 + 0.85;

        if *count == 0 {
            // Stub so the empty bucket still shows up
            let stub = [(left, 0.0), (right, y_top * 0.01)];
            chart.draw_series(std::iter::once(Rectangle::new(stub, ZERO_BAR.filled())))?;
            chart.draw_series(std::iter::once(Rectangle::new(stub, ZERO_EDGE.stroke_width(1))))?;
        } else {
            let bar = [(left, 0.0), (right, *count as f64)];
            chart.draw_series(std::iter::once(Rectangle::new(bar, color.filled())))?;
            chart.draw_series(std::iter::once(Rectangle::new(bar, BLACK.mix(0.6).stroke_width(1))))?;
        }

        let top = (*count as f64).max(y_top * 0.01) + y_top * 0.01;
        chart.draw_series(std::iter::once(Text::new(
            count.to_string(),
            (i as f64 + 0.5, top),
            value_style.clone(),
        )))?;
    }

    let labels: Vec<String> = ordered.iter().map(|(label, _)| label.clone()).collect();
    let anchors: Vec<(i32, i32)> = (0..ordered.len())
        .map(|i| chart.backend_coord(&(i as f64 + 0.5, 0.0)))
        .collect();
    draw_wrapped_labels(root, &labels, &anchors, wrap_width)?;

    Ok(())
}
