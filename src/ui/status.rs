use std::fmt::Write as _;

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

use super::style::Palette;

/// The bottom row: search prompt while typing, else a toast, else status.
pub fn render_footer(model: &Model, palette: &Palette, frame: &mut Frame, area: Rect) {
    let (text, style) = if let Some(input) = model.search_input.as_deref() {
        (search_prompt(model, input), palette.search_bar)
    } else if let Some((message, level)) = model.active_toast() {
        let style = match level {
            ToastLevel::Info => palette.toast_info,
            ToastLevel::Error => palette.toast_error,
        };
        (format!(" {message}"), style)
    } else if let Some(url) = model.hovered_link_url() {
        (format!(" link: {url}"), palette.search_bar)
    } else {
        (status_line(model), palette.status)
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

pub fn search_prompt(model: &Model, input: &str) -> String {
    let doc = &model.document;
    let info = match (input.is_empty(), doc.current_search_index()) {
        (true, _) => String::new(),
        (false, Some(current)) => {
            format!("  [{}/{}]", current + 1, doc.search_results().len())
        }
        (false, None) => "  [no matches]".to_string(),
    };
    format!("/{input}{info}  Enter: done  Esc: clear")
}

pub fn status_line(model: &Model) -> String {
    let doc = &model.document;
    let viewport = doc.viewport();
    let line = if doc.line_count() == 0 {
        0
    } else {
        doc.scroll_position() + 1
    };
    let mut status = format!(
        " {}  [{}%]  Line {}/{}",
        model.file_name(),
        viewport.scroll_percent(),
        line,
        doc.line_count()
    );
    if let Some(query) = doc.search_query() {
        let current = doc.current_search_index().map_or(0, |i| i + 1);
        let _ = write!(status, "  /{query} {current}/{}", doc.search_results().len());
    }
    if model.watch_enabled {
        status.push_str(" [watching]");
    }
    if !doc.options().word_wrap {
        status.push_str(" [nowrap]");
    }
    status.push_str("  ?:help");
    status
}
