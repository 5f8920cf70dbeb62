use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tempfile::tempdir;

use crate::config::RichTextOptions;
use crate::events::RichTextEvent;

use super::event_loop::ResizeDebouncer;
use super::{App, Message, Model, update};

fn create_test_model() -> Model {
    Model::new(
        PathBuf::from("test.md"),
        "# Test\n\nHello world",
        RichTextOptions::default(),
        (80, 24),
    )
}

fn create_long_test_model() -> Model {
    let mut md = String::from("# Test Document\n\n");
    for i in 1..=50 {
        md.push_str(&format!("Line {i} of content.\n\n"));
    }
    Model::new(
        PathBuf::from("test.md"),
        md,
        RichTextOptions::default(),
        (80, 24),
    )
}

fn create_many_headings_model() -> Model {
    let mut md = String::new();
    for i in 1..=20 {
        md.push_str(&format!("## Heading {i}\n\nBody {i}\n\n"));
    }
    Model::new(
        PathBuf::from("test.md"),
        md,
        RichTextOptions::default(),
        (80, 8),
    )
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
    MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }
}

#[test]
fn test_document_height_excludes_footer() {
    let model = create_test_model();
    assert_eq!(model.document.viewport().height(), 23);
    assert_eq!(model.document.options().width, 80);
}

#[test]
fn test_scroll_down_updates_document() {
    let model = create_long_test_model();
    let model = update(model, Message::ScrollDown(5));
    assert_eq!(model.document.scroll_position(), 5);
}

#[test]
fn test_scroll_up_updates_document() {
    let mut model = create_long_test_model();
    model.document.scroll_down(10);
    let model = update(model, Message::ScrollUp(3));
    assert_eq!(model.document.scroll_position(), 7);
}

#[test]
fn test_go_to_bottom_and_top() {
    let model = create_long_test_model();
    let model = update(model, Message::GoToBottom);
    assert_eq!(model.document.scroll_position(), model.document.max_scroll());
    let model = update(model, Message::GoToTop);
    assert_eq!(model.document.scroll_position(), 0);
}

#[test]
fn test_next_and_previous_heading() {
    let model = create_many_headings_model();
    let second = model.document.headings()[1].line;
    let model = update(model, Message::NextHeading);
    assert_eq!(model.document.scroll_position(), second);
    let model = update(model, Message::PrevHeading);
    assert_eq!(model.document.scroll_position(), 0);
}

#[test]
fn test_resize_message_resizes_document() {
    let model = create_long_test_model();
    let model = update(model, Message::Resize(40, 10));
    assert_eq!(model.document.options().width, 40);
    assert_eq!(model.document.viewport().height(), 9);
}

#[test]
fn test_width_limit_caps_layout_width() {
    let mut model = create_long_test_model();
    model.set_width_limit(Some(60));
    assert_eq!(model.document.options().width, 60);
    let model = update(model, Message::Resize(40, 24));
    assert_eq!(model.document.options().width, 40);
    let model = update(model, Message::Resize(120, 24));
    assert_eq!(model.document.options().width, 60);
}

#[test]
fn test_search_flow() {
    let model = create_long_test_model();
    let model = update(model, Message::StartSearch);
    assert_eq!(model.search_input.as_deref(), Some(""));

    let model = update(model, Message::SearchInput("Line 4".to_string()));
    // "Line 4" and "Line 40".."Line 49"
    assert_eq!(model.document.search_results().len(), 11);
    assert_eq!(model.document.current_search_index(), Some(0));

    let model = update(model, Message::SubmitSearch);
    assert!(model.search_input.is_none());
    assert_eq!(model.document.search_query(), Some("Line 4"));

    let model = update(model, Message::NextMatch);
    assert_eq!(model.document.current_search_index(), Some(1));
    let model = update(model, Message::PrevMatch);
    let model = update(model, Message::PrevMatch);
    assert_eq!(model.document.current_search_index(), Some(10));

    let model = update(model, Message::ClearSearch);
    assert!(model.document.search_results().is_empty());
    assert!(model.document.search_query().is_none());
}

#[test]
fn test_search_scrolls_to_match() {
    let model = create_long_test_model();
    let model = update(model, Message::SearchInput("Line 50".to_string()));
    let line = model.document.search_results()[0].line;
    assert!(model.document.viewport().visible_range().contains(&line));
    assert!(model.document.scroll_position() > 0);
}

#[test]
fn test_toggle_options() {
    let model = create_test_model();
    let model = update(model, Message::ToggleLineNumbers);
    assert!(model.document.options().line_numbers);
    assert!(model.document.gutter_width() > 0);

    let model = update(model, Message::ToggleWrap);
    assert!(!model.document.options().word_wrap);

    let model = update(model, Message::ToggleHighlight);
    assert!(!model.document.options().syntax_highlighting);
}

#[test]
fn test_toggle_watch_and_help() {
    let model = create_test_model();
    let model = update(model, Message::ToggleWatch);
    assert!(model.watch_enabled);
    let model = update(model, Message::ToggleHelp);
    assert!(model.help_visible);
    let model = update(model, Message::HideHelp);
    assert!(!model.help_visible);
}

#[test]
fn test_quit() {
    let model = update(create_test_model(), Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_follow_link_emits_notification() {
    let model = Model::new(
        PathBuf::from("test.md"),
        "See [docs](https://example.com).",
        RichTextOptions::default(),
        (80, 24),
    );
    let mut model = update(model, Message::FollowPreferredLink);
    let events = model.drain_notifications();
    assert!(events.contains(&RichTextEvent::LinkActivated {
        text: "docs".to_string(),
        url: "https://example.com".to_string(),
    }));
}

#[test]
fn test_follow_preferred_link_prefers_hovered() {
    let model = Model::new(
        PathBuf::from("test.md"),
        "[a](#a) and [b](#b)\n\n# A\n\n# B",
        RichTextOptions::default(),
        (80, 24),
    );
    assert_eq!(model.preferred_link(), Some(0));
    let model = update(model, Message::HoverLink(Some(1)));
    assert_eq!(model.preferred_link(), Some(1));
    assert_eq!(model.hovered_link_url(), Some("#b"));
}

#[test]
fn test_key_mapping() {
    let model = create_test_model();
    assert_eq!(
        App::handle_key(key(KeyCode::Char('j')), &model),
        Some(Message::ScrollDown(1))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Char('G')), &model),
        Some(Message::GoToBottom)
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Char('5')), &model),
        Some(Message::GoToPercent(50))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Char('/')), &model),
        Some(Message::StartSearch)
    );
    assert_eq!(
        App::handle_key(
            KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL),
            &model
        ),
        Some(Message::HalfPageDown)
    );
    assert_eq!(
        App::handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &model
        ),
        Some(Message::Quit)
    );
}

#[test]
fn test_search_prompt_keys() {
    let mut model = create_test_model();
    model.search_input = Some("wor".to_string());
    assert_eq!(
        App::handle_key(key(KeyCode::Char('l')), &model),
        Some(Message::SearchInput("worl".to_string()))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Backspace), &model),
        Some(Message::SearchInput("wo".to_string()))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Enter), &model),
        Some(Message::SubmitSearch)
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Esc), &model),
        Some(Message::ClearSearch)
    );

    model.search_input = Some(String::new());
    assert_eq!(App::handle_key(key(KeyCode::Backspace), &model), None);
}

#[test]
fn test_help_swallows_keys() {
    let mut model = create_test_model();
    model.help_visible = true;
    assert_eq!(
        App::handle_key(key(KeyCode::Char('j')), &model),
        Some(Message::HideHelp)
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Char('q')), &model),
        Some(Message::Quit)
    );
}

#[test]
fn test_mouse_wheel_scrolls() {
    let model = create_test_model();
    assert_eq!(
        App::handle_mouse(mouse(MouseEventKind::ScrollDown, 5, 5), &model),
        Some(Message::ScrollDown(3))
    );
}

#[test]
fn test_mouse_click_on_link_follows_it() {
    let model = Model::new(
        PathBuf::from("test.md"),
        "Go [here](https://example.com) now",
        RichTextOptions::default(),
        (80, 24),
    );
    let region = model.document.links()[0].regions[0].clone();
    let column = u16::try_from(region.columns.start).expect("column");
    let row = u16::try_from(region.line).expect("row");

    assert_eq!(
        App::handle_mouse(
            mouse(
                MouseEventKind::Up(crossterm::event::MouseButton::Left),
                column,
                row
            ),
            &model
        ),
        Some(Message::FollowLink(0))
    );
    assert_eq!(
        App::handle_mouse(mouse(MouseEventKind::Moved, column, row), &model),
        Some(Message::HoverLink(Some(0)))
    );
    assert_eq!(
        App::handle_mouse(mouse(MouseEventKind::Moved, 0, row), &model),
        None
    );
}

#[test]
fn test_mouse_hit_test_accounts_for_gutter() {
    let model = Model::new(
        PathBuf::from("test.md"),
        "[here](https://example.com)",
        RichTextOptions::default().with_line_numbers(true),
        (80, 24),
    );
    let gutter = u16::try_from(model.document.gutter_width()).expect("gutter");
    assert_eq!(
        App::handle_mouse(mouse(MouseEventKind::Moved, 0, 0), &model),
        None
    );
    assert_eq!(
        App::handle_mouse(mouse(MouseEventKind::Moved, gutter, 0), &model),
        Some(Message::HoverLink(Some(0)))
    );
}

#[test]
fn test_resize_debouncer_waits_for_quiet_period() {
    let mut debouncer = ResizeDebouncer::new(50);
    debouncer.queue(100, 40, 0);
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.take_ready(10), None);
    debouncer.queue(120, 40, 20);
    assert_eq!(debouncer.take_ready(60), None);
    assert_eq!(debouncer.take_ready(70), Some((120, 40)));
    assert!(!debouncer.is_pending());
}

#[test]
fn test_reload_from_disk_updates_document() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("doc.md");
    std::fs::write(&path, "# One").expect("write");
    let mut model = Model::open(&path, RichTextOptions::default(), (80, 24)).expect("open");
    assert_eq!(model.document.headings()[0].text, "One");

    std::fs::write(&path, "# Two\n\nmore").expect("write");
    model.reload_from_disk().expect("reload");
    assert_eq!(model.document.headings()[0].text, "Two");
    let events = model.drain_notifications();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, RichTextEvent::ContentChanged { .. }))
    );
}

#[test]
fn test_open_source_file_renders_as_code() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("main.rs");
    std::fs::write(&path, "fn main() {}").expect("write");
    let model = Model::open(&path, RichTextOptions::default(), (80, 24)).expect("open");
    assert_eq!(model.document.elements().len(), 1);
    assert_eq!(
        model.document.elements()[0].language(),
        Some("rs")
    );
}

#[test]
fn test_open_missing_file_errors() {
    let dir = tempdir().expect("tempdir");
    let result = Model::open(
        &dir.path().join("missing.md"),
        RichTextOptions::default(),
        (80, 24),
    );
    assert!(result.is_err());
}

#[test]
fn test_toast_lifecycle() {
    let mut model = create_test_model();
    assert!(model.active_toast().is_none());
    model.show_toast(super::ToastLevel::Info, "hello");
    assert_eq!(
        model.active_toast(),
        Some(("hello", super::ToastLevel::Info))
    );
    assert!(!model.expire_toast());
}
