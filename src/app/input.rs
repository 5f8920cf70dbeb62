use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, Message, Model};

use super::event_loop::ResizeDebouncer;

const WHEEL_LINES: usize = 3;
const HORIZONTAL_STEP: usize = 4;

impl App {
    pub(super) fn handle_event(
        event: Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(key, model),
            Event::Mouse(mouse) => Self::handle_mouse(mouse, model),
            Event::Resize(w, h) => {
                tracing::trace!(width = w, height = h, "resize queued");
                resize_debouncer.queue(w, h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Message::Quit);
        }
        if let Some(input) = model.search_input.as_deref() {
            return Self::handle_search_key(key, input);
        }
        if model.help_visible {
            return match key.code {
                KeyCode::Char('q') => Some(Message::Quit),
                _ => Some(Message::HideHelp),
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('d') if ctrl => Some(Message::HalfPageDown),
            KeyCode::Char('u') if ctrl => Some(Message::HalfPageUp),
            KeyCode::Char('f') if ctrl => Some(Message::PageDown),
            KeyCode::Char('b') if ctrl => Some(Message::PageUp),
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Esc => Some(Message::ClearSearch),
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Enter => Some(Message::ScrollDown(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::ScrollUp(1)),
            KeyCode::Char(' ' | 'f') | KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::GoToBottom),
            KeyCode::Char('h') | KeyCode::Left => Some(Message::ScrollLeft(HORIZONTAL_STEP)),
            KeyCode::Char('l') | KeyCode::Right => Some(Message::ScrollRight(HORIZONTAL_STEP)),
            KeyCode::Char(']') => Some(Message::NextHeading),
            KeyCode::Char('[') => Some(Message::PrevHeading),
            KeyCode::Char('/') => Some(Message::StartSearch),
            KeyCode::Char('n') => Some(Message::NextMatch),
            KeyCode::Char('N') => Some(Message::PrevMatch),
            KeyCode::Char('o') => Some(Message::FollowPreferredLink),
            KeyCode::Char('#') => Some(Message::ToggleLineNumbers),
            KeyCode::Char('w') => Some(Message::ToggleWrap),
            KeyCode::Char('S') => Some(Message::ToggleHighlight),
            KeyCode::Char('W') => Some(Message::ToggleWatch),
            KeyCode::Char('r') => Some(Message::ForceReload),
            KeyCode::Char('?') => Some(Message::ToggleHelp),
            KeyCode::Char(c @ '0'..='9') => c
                .to_digit(10)
                .and_then(|d| u8::try_from(d * 10).ok())
                .map(Message::GoToPercent),
            _ => None,
        }
    }

    fn handle_search_key(key: KeyEvent, input: &str) -> Option<Message> {
        match key.code {
            KeyCode::Esc => Some(Message::ClearSearch),
            KeyCode::Enter => Some(Message::SubmitSearch),
            KeyCode::Backspace => {
                let mut query = input.to_string();
                query.pop()?;
                Some(Message::SearchInput(query))
            }
            KeyCode::Char(c) => Some(Message::SearchInput(format!("{input}{c}"))),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return None;
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => Some(Message::ScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp => Some(Message::ScrollUp(WHEEL_LINES)),
            MouseEventKind::ScrollRight => Some(Message::ScrollRight(HORIZONTAL_STEP)),
            MouseEventKind::ScrollLeft => Some(Message::ScrollLeft(HORIZONTAL_STEP)),
            MouseEventKind::Up(MouseButton::Left) => {
                link_under_pointer(model, mouse.column, mouse.row).map(Message::FollowLink)
            }
            MouseEventKind::Moved => {
                let link = link_under_pointer(model, mouse.column, mouse.row);
                (link != model.hovered_link).then_some(Message::HoverLink(link))
            }
            _ => None,
        }
    }
}

/// Index of the link drawn at a terminal cell, if any.
pub(super) fn link_under_pointer(model: &Model, column: u16, row: u16) -> Option<usize> {
    let doc = &model.document;
    let viewport = doc.viewport();
    if row >= viewport.height() || column >= doc.options().width {
        return None;
    }
    let text_column = usize::from(column).checked_sub(doc.gutter_width())?;
    let line = doc.scroll_position() + usize::from(row);
    doc.link_at(line, text_column + doc.horizontal_offset())
}
