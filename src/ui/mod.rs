//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`viewport`]: Scroll position and visible range management
//! - [`RichTextView`]: Ratatui widget drawing a document's visible lines
//! - [`style`]: Theming and colors

pub mod style;
pub mod viewport;

mod overlays;
mod render;
mod status;

pub use overlays::centered_rect;
pub use render::{RichTextView, gutter_label, styled_spans};
pub use status::{search_prompt, status_line};

use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::Model;

/// Rows below the document reserved for the footer.
pub const FOOTER_ROWS: u16 = 1;

/// Area the document occupies inside the terminal.
pub const fn document_area(area: Rect) -> Rect {
    Rect {
        height: area.height.saturating_sub(FOOTER_ROWS),
        ..area
    }
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let palette = style::Palette::current();
    let doc_area = document_area(area);
    frame.render_widget(
        RichTextView::new(&model.document).palette(palette.clone()),
        doc_area,
    );

    let footer = Rect {
        y: area.y + doc_area.height,
        height: area.height.saturating_sub(doc_area.height),
        ..area
    };
    status::render_footer(model, &palette, frame, footer);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

#[cfg(test)]
mod tests;
