use std::path::PathBuf;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;

use super::*;
use crate::app::Model;
use crate::config::RichTextOptions;
use crate::document::{Document, InlineSpan, InlineStyle, LineType, RenderedLine};
use crate::search::SearchMatch;
use style::Palette;

fn create_test_terminal() -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(80, 24)).expect("terminal")
}

fn row_text(buf: &Buffer, row: u16) -> String {
    (0..buf.area.width)
        .map(|x| buf[(x, row)].symbol())
        .collect::<String>()
}

fn draw(doc: &Document, width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    RichTextView::new(doc)
        .palette(Palette::dark())
        .render(area, &mut buf);
    buf
}

#[test]
fn test_view_draws_visible_lines() {
    let doc = Document::with_content(
        "# Title\n\nHello world",
        RichTextOptions::default().with_size(30, 5),
    );
    let buf = draw(&doc, 30, 5);
    assert!(row_text(&buf, 0).starts_with("# Title"));
    let all: String = (0..5).map(|r| row_text(&buf, r)).collect();
    assert!(all.contains("Hello world"));
}

#[test]
fn test_view_starts_at_scroll_offset() {
    let source = (0..20)
        .map(|i| format!("para {i}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    let mut doc = Document::with_content(source, RichTextOptions::default().with_size(30, 4));
    doc.scroll_to_line(2);
    let buf = draw(&doc, 30, 4);
    assert!(row_text(&buf, 0).starts_with("para 1"));
}

#[test]
fn test_view_draws_gutter() {
    let doc = Document::with_content(
        "one\n\ntwo",
        RichTextOptions::default()
            .with_size(30, 5)
            .with_line_numbers(true),
    );
    assert_eq!(doc.gutter_width(), 2);
    let buf = draw(&doc, 30, 5);
    assert!(row_text(&buf, 0).starts_with("1 one"));
    assert!(row_text(&buf, 2).starts_with("3 two"));
}

#[test]
fn test_view_applies_horizontal_offset() {
    let mut doc = Document::with_content(
        "abcdefghijklmnopqrstuvwxyz",
        RichTextOptions::default()
            .with_size(10, 3)
            .with_word_wrap(false),
    );
    doc.scroll_right(5);
    let buf = draw(&doc, 10, 3);
    assert_eq!(row_text(&buf, 0), "fghijklmno");
}

#[test]
fn test_view_highlights_search_matches() {
    let palette = Palette::dark();
    let mut doc = Document::with_content(
        "foo bar foo",
        RichTextOptions::default().with_size(20, 3),
    );
    doc.search("foo");
    let buf = draw(&doc, 20, 3);
    assert_eq!(buf[(0, 0)].bg, palette.current_match.bg.expect("bg"));
    assert_eq!(buf[(8, 0)].bg, palette.search_match.bg.expect("bg"));
    assert_ne!(buf[(4, 0)].bg, palette.search_match.bg.expect("bg"));
}

#[test]
fn test_styled_spans_merge_runs_and_split_at_matches() {
    let palette = Palette::dark();
    let line = RenderedLine::from_spans(
        LineType::Paragraph,
        vec![
            InlineSpan::new("hello ".to_string(), InlineStyle::default()),
            InlineSpan::new("world".to_string(), InlineStyle::default()),
        ],
    );
    let plain = styled_spans(&line, &palette, &[], None, 0);
    assert_eq!(plain.len(), 1);
    assert_eq!(plain[0].content, "hello world");

    let hit = SearchMatch {
        line: 0,
        start: 6,
        end: 11,
    };
    let marked = styled_spans(&line, &palette, &[hit], None, 0);
    let texts: Vec<_> = marked.iter().map(|s| s.content.to_string()).collect();
    assert_eq!(texts, vec!["hello ", "world"]);
}

#[test]
fn test_styled_spans_skip_wide_chars_by_column() {
    let palette = Palette::dark();
    let line = RenderedLine::new("日本語abc".to_string(), LineType::Paragraph);
    let spans = styled_spans(&line, &palette, &[], None, 4);
    let text: String = spans.iter().map(|s| s.content.to_string()).collect();
    assert_eq!(text, "語abc");
}

#[test]
fn test_gutter_label() {
    assert_eq!(gutter_label(0, 2), "1 ");
    assert_eq!(gutter_label(9, 3), "10 ");
    assert_eq!(gutter_label(4, 4), "  5 ");
}

#[test]
fn test_full_render_shows_status_bar() {
    let model = Model::new(
        PathBuf::from("notes.md"),
        "# Test\n\nHello world",
        RichTextOptions::default(),
        (80, 24),
    );
    let mut terminal = create_test_terminal();
    terminal
        .draw(|frame| render(&model, frame))
        .expect("draw");
    let buf = terminal.backend().buffer();
    let status = row_text(buf, 23);
    assert!(status.contains("notes.md"), "status: {status}");
    assert!(status.contains("?:help"));
}

#[test]
fn test_full_render_shows_search_prompt() {
    let mut model = Model::new(
        PathBuf::from("notes.md"),
        "Hello world",
        RichTextOptions::default(),
        (80, 24),
    );
    model.document.search("world");
    model.search_input = Some("world".to_string());
    let mut terminal = create_test_terminal();
    terminal
        .draw(|frame| render(&model, frame))
        .expect("draw");
    let status = row_text(terminal.backend().buffer(), 23);
    assert!(status.starts_with("/world  [1/1]"), "status: {status}");
}

#[test]
fn test_full_render_shows_image_placeholder() {
    let model = Model::new(
        PathBuf::from("notes.md"),
        "![My Image](missing.png)",
        RichTextOptions::default(),
        (80, 24),
    );
    let mut terminal = create_test_terminal();
    terminal
        .draw(|frame| render(&model, frame))
        .expect("draw");
    let content: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect();
    assert!(content.contains("My Image"));
}

#[test]
fn test_help_overlay_renders() {
    let mut model = Model::new(
        PathBuf::from("notes.md"),
        "text",
        RichTextOptions::default(),
        (80, 24),
    );
    model.help_visible = true;
    let mut terminal = create_test_terminal();
    terminal
        .draw(|frame| render(&model, frame))
        .expect("draw");
    let content: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect();
    assert!(content.contains("Keys"));
    assert!(content.contains("toggle line numbers"));
}

#[test]
fn test_status_line_reports_position() {
    let model = Model::new(
        PathBuf::from("notes.md"),
        "one",
        RichTextOptions::default().with_word_wrap(false),
        (80, 24),
    );
    let status = status_line(&model);
    assert!(status.contains("Line 1/1"));
    assert!(status.contains("[nowrap]"));
}

#[test]
fn test_centered_rect_fits_area() {
    let area = Rect::new(0, 0, 40, 10);
    let rect = centered_rect(area, 60, 4);
    assert_eq!(rect, Rect::new(0, 3, 40, 4));
}

#[test]
fn test_document_area_leaves_footer() {
    let area = Rect::new(0, 0, 80, 24);
    assert_eq!(document_area(area).height, 23);
}
