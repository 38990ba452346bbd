//! PNG chart rendering.
//!
//! Every chart is drawn on its own [`Figure`]: the bitmap backend is created,
//! drawn on, flushed and dropped inside [`Figure::render`], so no plotting
//! state outlives a single file.

pub mod bar;
pub mod comparison;
pub mod pie;
pub mod table;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::PathBuf;
use tracing::debug;

pub use bar::draw_frequency_bars;
pub use comparison::{draw_distributions, draw_mean_scores, draw_rankings};
pub use pie::draw_pie;
pub use table::draw_summary_table;

/// Drawing surface handed to chart functions.
pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub const FONT: &str = "sans-serif";

/// One PNG file and its pixel size.
#[derive(Debug, Clone)]
pub struct Figure {
    path: PathBuf,
    size: (u32, u32),
}

impl Figure {
    pub fn new(path: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Draw the figure and write it to disk. The backend is released before
    /// this returns.
    pub fn render<F>(self, draw: F) -> Result<PathBuf>
    where
        F: FnOnce(&Canvas<'_>) -> Result<()>,
    {
        {
            let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
            root.fill(&WHITE)?;
            draw(&root)?;
            root.present()
                .with_context(|| format!("Failed to write chart {}", self.path.display()))?;
        }

        debug!("Saved chart: {}", self.path.display());
        Ok(self.path)
    }
}

/// Per-group colours (matplotlib tab10 order).
pub const GROUP_COLORS: [RGBColor; 5] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
];

pub fn group_color(index: usize) -> RGBColor {
    GROUP_COLORS[index % GROUP_COLORS.len()]
}

/// Light pastel slices for pie charts.
pub const PIE_COLORS: [RGBColor; 12] = [
    RGBColor(0x8d, 0xd3, 0xc7),
    RGBColor(0xff, 0xff, 0xb3),
    RGBColor(0xbe, 0xba, 0xda),
    RGBColor(0xfb, 0x80, 0x72),
    RGBColor(0x80, 0xb1, 0xd3),
    RGBColor(0xfd, 0xb4, 0x62),
    RGBColor(0xb3, 0xde, 0x69),
    RGBColor(0xfc, 0xcd, 0xe5),
    RGBColor(0xd9, 0xd9, 0xd9),
    RGBColor(0xbc, 0x80, 0xbd),
    RGBColor(0xcc, 0xeb, 0xc5),
    RGBColor(0xff, 0xed, 0x6f),
];

pub const ZERO_BAR: RGBColor = RGBColor(0xd3, 0xd3, 0xd3);
pub const ZERO_EDGE: RGBColor = RGBColor(0xa9, 0xa9, 0xa9);

const VIRIDIS_STOPS: [(f64, (u8, u8, u8)); 5] = [
    (0.0, (0x44, 0x01, 0x54)),
    (0.25, (0x3b, 0x52, 0x8b)),
    (0.5, (0x21, 0x90, 0x8d)),
    (0.75, (0x5d, 0xc8, 0x63)),
    (1.0, (0xfd, 0xe7, 0x25)),
];

/// Viridis colour at `t` in [0, 1].
pub fn viridis(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let upper = VIRIDIS_STOPS
        .iter()
        .position(|(stop, _)| *stop >= t)
        .unwrap_or(VIRIDIS_STOPS.len() - 1)
        .max(1);
    let (t0, c0) = VIRIDIS_STOPS[upper - 1];
    let (t1, c1) = VIRIDIS_STOPS[upper];
    let f = (t - t0) / (t1 - t0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
    RGBColor(mix(c0.0, c1.0), mix(c0.1, c1.1), mix(c0.2, c1.2))
}

/// `n` colours evenly spaced over viridis between 0.3 and 0.9.
pub fn bar_gradient(n: usize) -> Vec<RGBColor> {
    match n {
        0 => Vec::new(),
        1 => vec![viridis(0.3)],
        _ => (0..n)
            .map(|i| viridis(0.3 + 0.6 * i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// Greedy word wrap at `width` columns; over-long words are split.
pub fn wrap_label(label: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in label.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Write wrapped category labels centred under each bar.
///
/// `anchors` are backend pixel positions of the bar centres on the x axis.
pub fn draw_wrapped_labels(
    area: &Canvas<'_>,
    labels: &[String],
    anchors: &[(i32, i32)],
    wrap_width: usize,
) -> Result<()> {
    let (base_x, base_y) = area.get_base_pixel();
    let style = (FONT, 13)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));

    for (label, &(x, y)) in labels.iter().zip(anchors) {
        for (line_no, line) in wrap_label(label, wrap_width).into_iter().enumerate() {
            let pos = (x - base_x, y - base_y + 8 + line_no as i32 * 15);
            area.draw(&Text::new(line, pos, style.clone()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_label() {
        assert_eq!(
            wrap_label("I mostly use the same tools for both", 15),
            vec!["I mostly use", "the same tools", "for both"]
        );
        assert_eq!(wrap_label("short", 15), vec!["short"]);
        assert_eq!(wrap_label("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_label("", 10).is_empty());
    }

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), RGBColor(0x44, 0x01, 0x54));
        assert_eq!(viridis(1.0), RGBColor(0xfd, 0xe7, 0x25));
        assert_eq!(viridis(0.5), RGBColor(0x21, 0x90, 0x8d));
    }

    #[test]
    fn test_bar_gradient_length() {
        assert!(bar_gradient(0).is_empty());
        assert_eq!(bar_gradient(1).len(), 1);
        let colors = bar_gradient(4);
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[3], viridis(0.9));
    }

    #[test]
    fn test_group_color_wraps() {
        assert_eq!(group_color(0), group_color(GROUP_COLORS.len()));
    }
}
