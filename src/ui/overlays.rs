use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Model;

const HELP_KEYS: &[(&str, &str)] = &[
    ("j/k, arrows", "scroll one line"),
    ("Space/b, PgDn/PgUp", "page down/up"),
    ("Ctrl-d/Ctrl-u", "half page down/up"),
    ("g/G, Home/End", "top/bottom"),
    ("0-9", "jump to 0%..90%"),
    ("h/l", "scroll left/right (no wrap)"),
    ("[ / ]", "previous/next heading"),
    ("/", "search"),
    ("n/N", "next/previous match"),
    ("o", "follow link under cursor or first visible"),
    ("#", "toggle line numbers"),
    ("w", "toggle word wrap"),
    ("S", "toggle syntax highlighting"),
    ("W", "toggle file watching"),
    ("r", "reload file"),
    ("q", "quit"),
];

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = HELP_KEYS
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("{keys:<20}"), Style::default().bold()),
                Span::raw(*action),
            ])
        })
        .collect();
    if let Some(path) = &model.config_global_path {
        lines.push(Line::raw(""));
        lines.push(Line::raw(format!("config: {}", path.display())));
    }
    if let Some(path) = &model.config_local_path {
        lines.push(Line::raw(format!("local:  {}", path.display())));
    }

    let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX);
    let popup = centered_rect(area, 56, height);
    frame.render_widget(Clear, popup);
    let help = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Keys ").borders(Borders::ALL));
    frame.render_widget(help, popup);
}

pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
