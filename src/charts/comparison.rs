//! Multi-panel charts comparing prototypes.

use super::{draw_wrapped_labels, group_color, wrap_label, Canvas, Figure, FONT};
use crate::analysis::LikertData;
use crate::models::{GroupSummary, RankingResult};
use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use std::path::{Path, PathBuf};

const LIKERT_TOP: f64 = 5.5;

/// Rows and columns for `panels` subplots, at most three per row.
pub fn grid_shape(panels: usize) -> (usize, usize) {
    let cols = panels.clamp(1, 3);
    let rows = ((panels + cols - 1) / cols).max(1);
    (rows, cols)
}

fn bold(size: u32) -> TextStyle<'static> {
    (FONT, size).into_font().style(FontStyle::Bold).color(&BLACK)
}

fn value_label_style() -> TextStyle<'static> {
    bold(13).pos(Pos::new(HPos::Center, VPos::Bottom))
}

/// Split a figure into a titled grid of panels.
fn titled_grid<'a>(root: &Canvas<'a>, title: &str, panels: usize) -> Result<Vec<Canvas<'a>>> {
    let root = root.titled(title, bold(26))?;
    let (rows, cols) = grid_shape(panels);
    Ok(root.split_evenly((rows, cols)))
}

fn group_names(summaries: &[GroupSummary]) -> Vec<String> {
    summaries.iter().map(|s| s.group.clone()).collect()
}

/// Mean score per group for each Likert question, with ±1 std error bars.
pub fn draw_mean_scores(path: &Path, summaries: &[GroupSummary], labels: &[String]) -> Result<PathBuf> {
    let (rows, cols) = grid_shape(labels.len());
    let size = (cols as u32 * 520, rows as u32 * 460 + 60);

    Figure::new(path, size).render(|root| {
        let panels = titled_grid(root, "Mean Scores by Prototype", labels.len())?;
        let groups = group_names(summaries);

        for (q, (panel, label)) in panels.iter().zip(labels).enumerate() {
            let n = groups.len().max(1);
            let mut chart = ChartBuilder::on(panel)
                .caption(label, bold(18))
                .margin(15)
                .x_label_area_size(35)
                .y_label_area_size(45)
                .build_cartesian_2d(0f64..n as f64, 0f64..LIKERT_TOP)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(0)
                .y_desc("Mean Score")
                .draw()?;

            for (g, summary) in summaries.iter().enumerate() {
                let Some(stats) = summary.questions.get(q).and_then(|(_, s)| s.as_ref()) else {
                    continue;
                };
                let color = group_color(g);
                let x = g as f64;

                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x + 0.2, 0.0), (x + 0.8, stats.mean)],
                    color.mix(0.8).filled(),
                )))?;
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x + 0.2, 0.0), (x + 0.8, stats.mean)],
                    BLACK.stroke_width(1),
                )))?;

                let mut label_y = stats.mean;
                if stats.std.is_finite() {
                    let low = (stats.mean - stats.std).max(0.0);
                    let high = (stats.mean + stats.std).min(LIKERT_TOP);
                    let mid = x + 0.5;
                    for segment in [
                        vec![(mid, low), (mid, high)],
                        vec![(mid - 0.08, low), (mid + 0.08, low)],
                        vec![(mid - 0.08, high), (mid + 0.08, high)],
                    ] {
                        chart.draw_series(std::iter::once(PathElement::new(
                            segment,
                            BLACK.stroke_width(2),
                        )))?;
                    }
                    label_y = high;
                }

                chart.draw_series(std::iter::once(Text::new(
                    format!("{:.2}", stats.mean),
                    (x + 0.5, (label_y + 0.05).min(LIKERT_TOP - 0.25)),
                    value_label_style(),
                )))?;
            }

            let anchors: Vec<(i32, i32)> = (0..groups.len())
                .map(|g| chart.backend_coord(&(g as f64 + 0.5, 0.0)))
                .collect();
            draw_wrapped_labels(panel, &groups, &anchors, 20)?;
        }

        Ok(())
    })
}

/// Histogram of ratings 1-5 for every question and group.
pub fn draw_distributions(path: &Path, data: &LikertData) -> Result<PathBuf> {
    let rows = data.labels.len().max(1);
    let cols = data.groups.len().max(1);
    let size = (cols as u32 * 380, rows as u32 * 300 + 60);

    Figure::new(path, size).render(|root| {
        let root = root.titled("Rating Distributions by Question and Prototype", bold(26))?;
        let panels = root.split_evenly((rows, cols));

        for (q, label) in data.labels.iter().enumerate() {
            let table = data.contingency_table(q);
            let top = table.iter().flatten().copied().max().unwrap_or(0).max(1) as f64 * 1.2;

            for (g, group) in data.groups.iter().enumerate() {
                let Some(panel) = panels.get(q * cols + g) else {
                    continue;
                };
                let counts = table.get(g).map(Vec::as_slice).unwrap_or(&[]);

                let caption = wrap_label(&format!("{}: {}", group, label), 45).join(" ");
                let mut chart = ChartBuilder::on(panel)
                    .caption(caption, bold(14))
                    .margin(10)
                    .x_label_area_size(30)
                    .y_label_area_size(40)
                    .build_cartesian_2d(0.5f64..5.5f64, 0f64..top)?;

                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .x_labels(5)
                    .x_label_formatter(&|x| format!("{:.0}", x))
                    .x_desc("Rating")
                    .y_desc("Count")
                    .draw()?;

                let color = group_color(g);
                for (i, count) in counts.iter().enumerate() {
                    let rating = i as f64 + 1.0;
                    chart.draw_series(std::iter::once(Rectangle::new(
                        [(rating - 0.4, 0.0), (rating + 0.4, *count as f64)],
                        color.mix(0.7).filled(),
                    )))?;
                    if *count > 0 {
                        chart.draw_series(std::iter::once(Text::new(
                            count.to_string(),
                            (rating, *count as f64 + top * 0.01),
                            value_label_style(),
                        )))?;
                    }
                }
            }
        }

        Ok(())
    })
}

/// Caption for a ranking panel, with `*` marking a significant result.
pub fn ranking_caption(result: &RankingResult) -> String {
    let marker = if result.result.significant { "*" } else { "" };
    format!("{} (p = {:.4}{})", result.label, result.result.p_value, marker)
}

/// Start and end points of a dashed line from `from` to `to`.
fn dashed_segments(from: f64, to: f64, dash: f64) -> Vec<(f64, f64)> {
    let mut segments = Vec::new();
    let mut x = from;
    while x < to {
        segments.push((x, (x + dash).min(to)));
        x += dash * 2.0;
    }
    segments
}

/// Votes per prototype for each ranking question against the uniform expectation.
pub fn draw_rankings(path: &Path, rankings: &[RankingResult]) -> Result<PathBuf> {
    let panels = rankings.len().max(1);
    let size = (panels as u32 * 560, 520);

    Figure::new(path, size).render(|root| {
        let root = root.titled("Prototype Rankings", bold(26))?;
        let areas = root.split_evenly((1, panels));

        for (panel, ranking) in areas.iter().zip(rankings) {
            let bars: Vec<(String, usize)> = ranking
                .counts
                .iter()
                .map(|(label, count)| (label.to_string(), count))
                .collect();
            let n = bars.len().max(1);
            let expected = ranking.total_responses as f64 / n as f64;
            let max = bars.iter().map(|(_, c)| *c).max().unwrap_or(0) as f64;
            let top = max.max(expected).max(1.0) * 1.2;

            let mut chart = ChartBuilder::on(panel)
                .caption(ranking_caption(ranking), bold(17))
                .margin(15)
                .x_label_area_size(35)
                .y_label_area_size(45)
                .build_cartesian_2d(0f64..n as f64, 0f64..top)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(0)
                .y_desc("Votes")
                .draw()?;

            for (i, (_, count)) in bars.iter().enumerate() {
                let x = i as f64;
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x + 0.2, 0.0), (x + 0.8, *count as f64)],
                    group_color(i).mix(0.8).filled(),
                )))?;
                chart.draw_series(std::iter::once(Text::new(
                    count.to_string(),
                    (x + 0.5, *count as f64 + top * 0.01),
                    value_label_style(),
                )))?;
            }

            if ranking.total_responses > 0 {
                let dashes = dashed_segments(0.0, n as f64, 0.08);
                chart
                    .draw_series(
                        dashes
                            .into_iter()
                            .map(|(from, to)| PathElement::new(vec![(from, expected), (to, expected)], RED.stroke_width(2))),
                    )?
                    .label(format!("Expected ({:.1})", expected))
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

                chart
                    .configure_series_labels()
                    .background_style(&WHITE.mix(0.8))
                    .border_style(&BLACK)
                    .draw()?;
            }

            let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();
            let anchors: Vec<(i32, i32)> = (0..labels.len())
                .map(|i| chart.backend_coord(&(i as f64 + 0.5, 0.0)))
                .collect();
            draw_wrapped_labels(panel, &labels, &anchors, 20)?;
        }

        Ok(())
    })
}
