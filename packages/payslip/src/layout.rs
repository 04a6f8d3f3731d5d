//! Page text and word boxes.
//!
//! The PDF renderer hands over raw page text and, when asked, positioned
//! words. Two-column payslips (earnings left, deductions right) read
//! poorly as linear text; [`split_columns`] rebuilds such a page as its
//! left half followed by its right half, one region per period.

use serde::{Deserialize, Serialize};

/// Words whose vertical centers differ by less than this (in points) sit
/// on the same line.
const Y_TOLERANCE: f32 = 2.0;

/// A positioned word. Coordinates grow rightwards and downwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub text: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl WordBox {
    #[must_use]
    pub fn center_x(&self) -> f32 {
        f32::midpoint(self.x0, self.x1)
    }

    #[must_use]
    pub fn center_y(&self) -> f32 {
        f32::midpoint(self.y0, self.y1)
    }

    fn height(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }
}

/// One rendered page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub text: String,
    /// Positioned words; empty when the renderer was not asked for them.
    #[serde(default)]
    pub words: Vec<WordBox>,
    /// Page width in points. Derived from the words when absent.
    #[serde(default)]
    pub width: Option<f32>,
}

impl Page {
    /// A page known only by its text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Groups words into rows, top to bottom, each row left to right.
fn group_rows<'w>(words: &[&'w WordBox]) -> Vec<Vec<&'w WordBox>> {
    let mut sorted: Vec<&WordBox> = words.to_vec();
    sorted.sort_by(|a, b| {
        a.center_y()
            .total_cmp(&b.center_y())
            .then(a.x0.total_cmp(&b.x0))
    });

    let mut rows: Vec<(f32, Vec<&WordBox>)> = Vec::new();
    for word in sorted {
        let tolerance = (word.height() * 0.5).max(Y_TOLERANCE);
        match rows.last_mut() {
            Some((y, members)) if (word.center_y() - *y).abs() <= tolerance => members.push(word),
            _ => rows.push((word.center_y(), vec![word])),
        }
    }

    rows.into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            members
        })
        .collect()
}

fn row_text(row: &[&WordBox]) -> String {
    row.iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rebuilds a page as its left half followed by its right half.
///
/// Words are assigned to a half by their horizontal center relative to
/// the page midpoint. Rows for which `is_full_width` holds, or whose words
/// all straddle the midpoint (centered titles), are kept whole and close
/// the region above them: each region between such rows is emitted as its
/// left lines then its right lines, so a centered period header stays
/// ahead of both columns it heads. Returns `None` when the page carries no
/// words.
#[must_use]
pub fn split_columns(page: &Page, is_full_width: impl Fn(&str) -> bool) -> Option<String> {
    if page.words.is_empty() {
        return None;
    }
    let width = page
        .width
        .unwrap_or_else(|| page.words.iter().map(|w| w.x1).fold(0.0, f32::max));
    let middle = width / 2.0;

    let all: Vec<&WordBox> = page.words.iter().collect();
    let mut lines: Vec<String> = Vec::new();
    let mut left: Vec<String> = Vec::new();
    let mut right: Vec<String> = Vec::new();
    let mut regions = 1;

    for row in group_rows(&all) {
        let text = row_text(&row);
        let centered = row.iter().all(|w| w.x0 < middle && middle < w.x1);
        if centered || is_full_width(&text) {
            lines.append(&mut left);
            lines.append(&mut right);
            lines.push(text);
            regions += 1;
            continue;
        }

        let (l, r): (Vec<&WordBox>, Vec<&WordBox>) =
            row.into_iter().partition(|w| w.center_x() < middle);
        if !l.is_empty() {
            left.push(row_text(&l));
        }
        if !r.is_empty() {
            right.push(row_text(&r));
        }
    }
    lines.append(&mut left);
    lines.append(&mut right);

    log::trace!(
        "Split page of {} word(s) at x={middle} into {regions} region(s)",
        page.words.len()
    );

    Some(lines.join("\n") + "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f32, y0: f32) -> WordBox {
        WordBox {
            text: text.to_owned(),
            x0,
            y0,
            x1: x0 + 8.0 * text.chars().count() as f32 / 2.0,
            y1: y0 + 10.0,
        }
    }

    #[test]
    fn groups_words_into_lines() {
        let words = [
            word("B", 50.0, 100.5),
            word("A", 10.0, 100.0),
            word("C", 10.0, 120.0),
        ];
        let refs: Vec<&WordBox> = words.iter().collect();
        let lines: Vec<String> = group_rows(&refs).iter().map(|row| row_text(row)).collect();
        assert_eq!(lines, ["A B", "C"]);
    }

    #[test]
    fn splits_two_columns() {
        let page = Page {
            text: String::new(),
            words: vec![
                word("VANTAGENS", 10.0, 10.0),
                word("DESCONTOS", 310.0, 10.0),
                word("7033", 10.0, 30.0),
                word("1.185,54", 200.0, 30.0),
                word("7034", 310.0, 30.0),
                word("450,00", 500.0, 30.0),
            ],
            width: Some(600.0),
        };
        assert_eq!(
            split_columns(&page, |_| false).unwrap(),
            "VANTAGENS\n7033 1.185,54\nDESCONTOS\n7034 450,00\n"
        );
    }

    #[test]
    fn centered_header_stays_ahead_of_both_columns() {
        let page = Page {
            text: String::new(),
            words: vec![
                WordBox {
                    text: "Janeiro/2023".to_owned(),
                    x0: 260.0,
                    y0: 0.0,
                    x1: 340.0,
                    y1: 10.0,
                },
                word("7033", 10.0, 30.0),
                word("1.185,54", 200.0, 30.0),
                word("7034", 310.0, 30.0),
                word("450,00", 500.0, 30.0),
            ],
            width: Some(600.0),
        };
        assert_eq!(
            split_columns(&page, |_| false).unwrap(),
            "Janeiro/2023\n7033 1.185,54\n7034 450,00\n"
        );
    }

    #[test]
    fn full_width_rows_split_the_page_into_regions() {
        let page = Page {
            text: String::new(),
            words: vec![
                word("Janeiro/2023", 10.0, 0.0),
                word("7033", 10.0, 30.0),
                word("100,00", 200.0, 30.0),
                word("7034", 310.0, 30.0),
                word("1,00", 500.0, 30.0),
                word("Fevereiro/2023", 10.0, 60.0),
                word("7033", 10.0, 90.0),
                word("200,00", 200.0, 90.0),
                word("7034", 310.0, 90.0),
                word("2,00", 500.0, 90.0),
            ],
            width: Some(600.0),
        };
        let is_header = |line: &str| line.ends_with("/2023");
        assert_eq!(
            split_columns(&page, is_header).unwrap(),
            "Janeiro/2023\n7033 100,00\n7034 1,00\n\
             Fevereiro/2023\n7033 200,00\n7034 2,00\n"
        );
    }

    #[test]
    fn no_words_means_no_split() {
        assert_eq!(split_columns(&Page::from_text("x"), |_| false), None);
    }
}
