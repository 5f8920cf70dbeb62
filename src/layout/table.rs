//! Pipe table rendering.

use crate::document::{Alignment, InlineSpan, InlineStyle};

use super::wrap::{display_width, split_at_width};

/// Characters used to draw a table frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BorderSet {
    vertical: char,
    horizontal: char,
    top: [char; 3],
    middle: [char; 3],
    bottom: [char; 3],
}

impl BorderSet {
    /// ASCII border chars select a `+-|` frame; anything else draws box lines
    /// with the given char as the vertical rule.
    const fn for_char(vertical: char) -> Self {
        if vertical.is_ascii() {
            Self {
                vertical,
                horizontal: '-',
                top: ['+', '+', '+'],
                middle: ['+', '+', '+'],
                bottom: ['+', '+', '+'],
            }
        } else {
            Self {
                vertical,
                horizontal: '─',
                top: ['┌', '┬', '┐'],
                middle: ['├', '┼', '┤'],
                bottom: ['└', '┴', '┘'],
            }
        }
    }
}

/// Render a table to styled rows. Header cells are bold.
///
/// With `max_width` set, the widest column shrinks one cell at a time until
/// the frame fits; cells are truncated to their column.
pub fn render_table(
    alignments: &[Alignment],
    header: Option<&[String]>,
    rows: &[Vec<String>],
    border: char,
    max_width: Option<usize>,
) -> Vec<Vec<InlineSpan>> {
    let mut all_rows: Vec<&[String]> = Vec::new();
    if let Some(header) = header {
        all_rows.push(header);
    }
    all_rows.extend(rows.iter().map(Vec::as_slice));

    let num_cols = all_rows.iter().map(|row| row.len()).max().unwrap_or(0);
    if num_cols == 0 {
        return Vec::new();
    }

    let mut col_widths = vec![1_usize; num_cols];
    for row in &all_rows {
        for (idx, cell) in row.iter().enumerate() {
            col_widths[idx] = col_widths[idx].max(display_width(cell));
        }
    }

    // Row width is 1 + sum(col_width + 3).
    if let Some(max_width) = max_width {
        while 1 + col_widths.iter().sum::<usize>() + (3 * num_cols) > max_width {
            let Some((widest_idx, _)) = col_widths.iter().enumerate().max_by_key(|(_, w)| **w)
            else {
                break;
            };
            if col_widths[widest_idx] > 1 {
                col_widths[widest_idx] -= 1;
            } else {
                break;
            }
        }
    }

    let borders = BorderSet::for_char(border);
    let mut lines = Vec::new();
    lines.push(border_line(&col_widths, &borders, borders.top));
    for (idx, row) in all_rows.iter().enumerate() {
        let is_header = header.is_some() && idx == 0;
        lines.push(table_row(row, &col_widths, alignments, &borders, is_header));
        if is_header {
            lines.push(border_line(&col_widths, &borders, borders.middle));
        }
    }
    lines.push(border_line(&col_widths, &borders, borders.bottom));
    lines
}

fn border_line(widths: &[usize], borders: &BorderSet, [left, middle, right]: [char; 3]) -> Vec<InlineSpan> {
    let mut out = String::new();
    out.push(left);
    for (idx, width) in widths.iter().enumerate() {
        out.extend(std::iter::repeat_n(borders.horizontal, width + 2));
        if idx + 1 < widths.len() {
            out.push(middle);
        }
    }
    out.push(right);
    vec![InlineSpan::new(out, InlineStyle::default())]
}

fn table_row(
    cells: &[String],
    widths: &[usize],
    alignments: &[Alignment],
    borders: &BorderSet,
    is_header: bool,
) -> Vec<InlineSpan> {
    let mut cell_style = InlineStyle::default();
    cell_style.strong = is_header;

    let mut spans = Vec::new();
    let mut frame = String::from(borders.vertical);
    for (idx, width) in widths.iter().enumerate() {
        let content = cells.get(idx).map_or("", String::as_str);
        let (content, _) = split_at_width(content, *width);
        let padding = width.saturating_sub(display_width(&content));
        let (left, right) = match alignments.get(idx).copied().unwrap_or_default() {
            Alignment::Right => (padding, 0),
            Alignment::Center => (padding / 2, padding - padding / 2),
            Alignment::Left | Alignment::None => (0, padding),
        };

        frame.push(' ');
        frame.extend(std::iter::repeat_n(' ', left));
        spans.push(InlineSpan::new(std::mem::take(&mut frame), InlineStyle::default()));
        if !content.is_empty() {
            spans.push(InlineSpan::new(content, cell_style));
        }
        frame.extend(std::iter::repeat_n(' ', right));
        frame.push(' ');
        frame.push(borders.vertical);
    }
    spans.push(InlineSpan::new(frame, InlineStyle::default()));
    spans
}
