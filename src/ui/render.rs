use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthChar;

use crate::document::{Document, RenderedLine};
use crate::search::SearchMatch;

use super::style::Palette;

/// Draws the visible lines of a [`Document`].
///
/// The widget reads the document's cached layout; it never triggers a
/// relayout. Size the document to the widget's area with
/// [`Document::resize`] before drawing.
#[derive(Debug, Clone)]
pub struct RichTextView<'a> {
    document: &'a Document,
    palette: Palette,
}

impl<'a> RichTextView<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            palette: Palette::current(),
        }
    }

    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

impl Widget for RichTextView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let doc = self.document;
        let search = doc.search_state();
        let current = search.current().copied();
        let gutter = doc.gutter_width();
        let skip = doc.horizontal_offset();
        let first = doc.scroll_position();

        for (row, line) in doc.visible_lines().iter().enumerate() {
            let Ok(row) = u16::try_from(row) else {
                break;
            };
            if row >= area.height {
                break;
            }
            let index = first + row as usize;
            let mut spans = Vec::new();
            if gutter > 0 {
                spans.push(Span::styled(
                    gutter_label(index, gutter),
                    self.palette.gutter,
                ));
            }
            spans.extend(styled_spans(
                line,
                &self.palette,
                search.matches_on_line(index),
                current.filter(|m| m.line == index),
                skip,
            ));
            buf.set_line(area.x, area.y + row, &Line::from(spans), area.width);
        }
    }
}

/// Right-aligned 1-based line number followed by a separator space.
pub fn gutter_label(index: usize, gutter: usize) -> String {
    let digits = gutter.saturating_sub(1);
    format!("{:>digits$} ", index + 1)
}

/// Style one rendered line, overlay search matches, and drop the first
/// `skip` display columns.
pub fn styled_spans(
    line: &RenderedLine,
    palette: &Palette,
    matches: &[SearchMatch],
    current: Option<SearchMatch>,
    skip: usize,
) -> Vec<Span<'static>> {
    let base = palette.line_style(*line.line_type());
    let mut out: Vec<Span<'static>> = Vec::new();
    let mut pending = String::new();
    let mut pending_style = Style::default();
    let mut char_index = 0usize;
    let mut column = 0usize;

    for span in line.spans() {
        let span_style = palette.span_style(base, span.style());
        for ch in span.text().chars() {
            let width = ch.width().unwrap_or(0);
            let hidden = column < skip;
            column += width;
            let style = match_style(char_index, matches, current, palette)
                .map_or(span_style, |overlay| span_style.patch(overlay));
            char_index += 1;
            if hidden {
                continue;
            }
            if style != pending_style && !pending.is_empty() {
                out.push(Span::styled(std::mem::take(&mut pending), pending_style));
            }
            pending_style = style;
            pending.push(ch);
        }
    }
    if !pending.is_empty() {
        out.push(Span::styled(pending, pending_style));
    }
    out
}

fn match_style(
    char_index: usize,
    matches: &[SearchMatch],
    current: Option<SearchMatch>,
    palette: &Palette,
) -> Option<Style> {
    if current.is_some_and(|m| (m.start..m.end).contains(&char_index)) {
        return Some(palette.current_match);
    }
    matches
        .iter()
        .any(|m| (m.start..m.end).contains(&char_index))
        .then_some(palette.search_match)
}
