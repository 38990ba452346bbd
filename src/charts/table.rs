//! Summary table image: one row per question, one column per prototype.

use super::{wrap_label, Figure, FONT};
use crate::models::{GroupSummary, NumericSummary};
use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use std::path::{Path, PathBuf};

const HEADER_BG: RGBColor = RGBColor(0x40, 0x46, 0x6e);
const STRIPE_BG: RGBColor = RGBColor(0xf0, 0xf0, 0xf0);
const GRID: RGBColor = RGBColor(0xbb, 0xbb, 0xbb);

const FIRST_COLUMN: i32 = 220;
const COLUMN: i32 = 210;
const HEADER_HEIGHT: i32 = 70;
const ROW_HEIGHT: i32 = 44;
const TITLE_HEIGHT: i32 = 60;
const PADDING: i32 = 20;

/// "mean ± std" with two decimals, or "N/A" when the group has no ratings.
pub fn format_cell(summary: Option<&NumericSummary>) -> String {
    match summary {
        Some(s) if s.std.is_finite() => format!("{:.2} ± {:.2}", s.mean, s.std),
        Some(s) => format!("{:.2}", s.mean),
        None => "N/A".to_string(),
    }
}

pub fn draw_summary_table(path: &Path, summaries: &[GroupSummary], labels: &[String]) -> Result<PathBuf> {
    let width = 2 * PADDING + FIRST_COLUMN + COLUMN * summaries.len() as i32;
    let height = TITLE_HEIGHT + HEADER_HEIGHT + ROW_HEIGHT * labels.len() as i32 + 2 * PADDING;

    Figure::new(path, (width as u32, height as u32)).render(|root| {
        let centered = |size: u32, color: &RGBColor, bold: bool| {
            let font = (FONT, size).into_font();
            let font = if bold { font.style(FontStyle::Bold) } else { font };
            font.color(color).pos(Pos::new(HPos::Center, VPos::Center))
        };

        root.draw(&Text::new(
            "Summary of Mean Scores ± Standard Deviation",
            (width / 2, PADDING + TITLE_HEIGHT / 3),
            centered(22, &BLACK, true),
        ))?;

        let top = PADDING + TITLE_HEIGHT;
        let right = width - PADDING;
        let column_left = |c: usize| match c {
            0 => PADDING,
            _ => PADDING + FIRST_COLUMN + COLUMN * (c as i32 - 1),
        };
        let column_width = |c: usize| if c == 0 { FIRST_COLUMN } else { COLUMN };

        root.draw(&Rectangle::new(
            [(PADDING, top), (right, top + HEADER_HEIGHT)],
            HEADER_BG.filled(),
        ))?;

        let headers = std::iter::once("Question".to_string())
            .chain(summaries.iter().map(|s| format!("Prototype {}", s.group)));
        for (c, header) in headers.enumerate() {
            root.draw(&Text::new(
                header,
                (column_left(c) + column_width(c) / 2, top + HEADER_HEIGHT / 2),
                centered(15, &WHITE, true),
            ))?;
        }

        for (r, label) in labels.iter().enumerate() {
            let row_top = top + HEADER_HEIGHT + r as i32 * ROW_HEIGHT;
            root.draw(&Rectangle::new(
                [(PADDING, row_top), (right, row_top + ROW_HEIGHT)],
                row_background(r).filled(),
            ))?;

            let question_lines = wrap_label(label, 20);
            let first_y = row_top + ROW_HEIGHT / 2 - (question_lines.len() as i32 - 1) * 8;
            for (line_no, line) in question_lines.into_iter().enumerate() {
                root.draw(&Text::new(
                    line,
                    (PADDING + FIRST_COLUMN / 2, first_y + line_no as i32 * 16),
                    centered(14, &BLACK, true),
                ))?;
            }

            for (c, summary) in summaries.iter().enumerate() {
                root.draw(&Text::new(
                    format_cell(summary.summary(label)),
                    (column_left(c + 1) + COLUMN / 2, row_top + ROW_HEIGHT / 2),
                    centered(14, &BLACK, false),
                ))?;
            }
        }

        let bottom = top + HEADER_HEIGHT + ROW_HEIGHT * labels.len() as i32;
        for c in 0..=summaries.len() + 1 {
            let x = if c > summaries.len() { right } else { column_left(c) };
            root.draw(&PathElement::new(vec![(x, top), (x, bottom)], GRID.stroke_width(1)))?;
        }
        for r in 0..=labels.len() {
            let y = top + HEADER_HEIGHT + r as i32 * ROW_HEIGHT;
            root.draw(&PathElement::new(vec![(PADDING, y), (right, y)], GRID.stroke_width(1)))?;
        }
        root.draw(&PathElement::new(vec![(PADDING, top), (right, top)], GRID.stroke_width(1)))?;

        Ok(())
    })
}

/// Data rows alternate white and grey, starting with white.
fn row_background(row: usize) -> RGBColor {
    if row % 2 == 1 {
        STRIPE_BG
    } else {
        WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(mean: f64, std: f64) -> NumericSummary {
        NumericSummary {
            mean,
            median: mean,
            std,
            min: 1,
            max: 5,
            n: 4,
        }
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(Some(&summary(4.25, 0.5))), "4.25 ± 0.50");
        assert_eq!(format_cell(Some(&summary(3.0, f64::NAN))), "3.00");
        assert_eq!(format_cell(None), "N/A");
    }

    #[test]
    fn test_row_background_stripes_second_row() {
        assert_eq!(row_background(0), WHITE);
        assert_eq!(row_background(1), STRIPE_BG);
        assert_eq!(row_background(2), WHITE);
        assert_eq!(row_background(3), STRIPE_BG);
    }

    #[test]
    fn test_draw_summary_table_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let summaries = vec![
            GroupSummary {
                group: "A".to_string(),
                questions: vec![
                    ("Easy to Use".to_string(), Some(summary(4.25, 0.5))),
                    ("Has Features Needed".to_string(), None),
                ],
            },
            GroupSummary {
                group: "B".to_string(),
                questions: vec![
                    ("Easy to Use".to_string(), Some(summary(2.0, f64::NAN))),
                    ("Has Features Needed".to_string(), Some(summary(3.5, 1.0))),
                ],
            },
        ];
        let labels = vec!["Easy to Use".to_string(), "Has Features Needed".to_string()];

        let path = draw_summary_table(&dir.path().join("summary_table.png"), &summaries, &labels).unwrap();
        assert!(path.exists());
    }
}
