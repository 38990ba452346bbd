//! Pie charts with percentage labels and a side legend.

use super::{wrap_label, Canvas, Figure, FONT, PIE_COLORS};
use crate::config::ChartConfig;
use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};

/// Arc resolution in points per full turn.
const ARC_STEPS: f64 = 180.0;

/// Draw `slices` clockwise from twelve o'clock.
pub fn draw_pie(
    path: &Path,
    title: &str,
    slices: &[(String, usize)],
    config: &ChartConfig,
) -> Result<PathBuf> {
    Figure::new(path, config.pie_size).render(|root| draw_slices(root, title, slices, config.wrap_width))
}

/// Fraction of the whole held by each slice. Empty input gives an empty list.
pub fn slice_fractions(slices: &[(String, usize)]) -> Vec<f64> {
    let total: usize = slices.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return Vec::new();
    }
    slices.iter().map(|(_, c)| *c as f64 / total as f64).collect()
}

fn draw_slices(root: &Canvas<'_>, title: &str, slices: &[(String, usize)], wrap_width: usize) -> Result<()> {
    let (width, height) = root.dim_in_pixel();
    let title_style = (FONT, 22)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (line_no, line) in wrap_label(title, 70).into_iter().enumerate() {
        root.draw(&Text::new(
            line,
            (width as i32 / 2, 15 + line_no as i32 * 26),
            title_style.clone(),
        ))?;
    }

    let fractions = slice_fractions(slices);
    if fractions.is_empty() {
        return Ok(());
    }

    let pie_width = (width as f64 * 0.62) as i32;
    let center = (pie_width / 2 + 20, height as i32 / 2 + 30);
    let radius = (pie_width.min(height as i32 - 120) as f64 / 2.0 - 20.0).max(10.0);

    let label_style = (FONT, 15)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    let point = |angle: f64, r: f64| -> (i32, i32) {
        (
            center.0 + (r * angle.cos()).round() as i32,
            center.1 - (r * angle.sin()).round() as i32,
        )
    };

    let mut start = FRAC_PI_2;
    for (i, fraction) in fractions.iter().enumerate() {
        let sweep = fraction * TAU;
        let color = PIE_COLORS[i % PIE_COLORS.len()];

        let steps = ((ARC_STEPS * fraction).ceil() as usize).max(2);
        let mut wedge = vec![center];
        wedge.extend((0..=steps).map(|s| point(start - sweep * s as f64 / steps as f64, radius)));

        root.draw(&Polygon::new(wedge.clone(), color.filled()))?;
        wedge.push(center);
        root.draw(&PathElement::new(wedge, WHITE.stroke_width(2)))?;

        if *fraction > 0.0 {
            let mid = start - sweep / 2.0;
            root.draw(&Text::new(
                format!("{:.1}%", fraction * 100.0),
                point(mid, radius * 0.65),
                label_style.clone(),
            ))?;
        }

        start -= sweep;
    }

    draw_legend(root, slices, (pie_width + 50, 90), wrap_width)
}

fn draw_legend(
    root: &Canvas<'_>,
    slices: &[(String, usize)],
    origin: (i32, i32),
    wrap_width: usize,
) -> Result<()> {
    let text_style = (FONT, 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Top));

    let mut y = origin.1;
    for (i, (label, count)) in slices.iter().enumerate() {
        let color = PIE_COLORS[i % PIE_COLORS.len()];
        root.draw(&Rectangle::new(
            [(origin.0, y), (origin.0 + 16, y + 16)],
            color.filled(),
        ))?;

        let text = format!("{} ({})", label, count);
        let lines = wrap_label(&text, wrap_width);
        for (line_no, line) in lines.iter().enumerate() {
            root.draw(&Text::new(
                line.clone(),
                (origin.0 + 24, y + line_no as i32 * 17),
                text_style.clone(),
            ))?;
        }
        y += lines.len().max(1) as i32 * 17 + 10;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slices(counts: &[usize]) -> Vec<(String, usize)> {
        counts
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("Option {}", i), *c))
            .collect()
    }

    #[test]
    fn test_slice_fractions_sum_to_one() {
        let fractions = slice_fractions(&slices(&[3, 1, 4, 2]));
        assert_eq!(fractions.len(), 4);
        assert!((fractions.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((fractions[2] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_slice_fractions_empty_total() {
        assert!(slice_fractions(&slices(&[0, 0])).is_empty());
        assert!(slice_fractions(&[]).is_empty());
    }
}
