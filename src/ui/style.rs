//! Colors for rendered lines, spans and chrome.
//!
//! Uses ANSI colors that adapt to the terminal's palette, with a darker set
//! for light backgrounds. Syntax token colors come from the highlighter as RGB
//! and are downsampled when the terminal lacks truecolor.

use ratatui::style::{Color, Modifier, Style};

use crate::document::{InlineColor, InlineStyle, LineType};

/// Styles for one background mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    headings: [Style; 6],
    pub code: Style,
    pub inline_code: Style,
    pub quote: Style,
    pub rule: Style,
    pub image: Style,
    pub link: Style,
    pub gutter: Style,
    pub search_match: Style,
    pub current_match: Style,
    pub status: Style,
    pub search_bar: Style,
    pub toast_info: Style,
    pub toast_error: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}

impl Palette {
    /// Palette for the detected or forced background.
    pub fn current() -> Self {
        if crate::highlight::is_light_background() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    pub fn dark() -> Self {
        let bold = |color| Style::default().fg(color).add_modifier(Modifier::BOLD);
        Self {
            headings: [
                bold(Color::Cyan).add_modifier(Modifier::UNDERLINED),
                bold(Color::Green),
                bold(Color::Yellow),
                bold(Color::Blue),
                bold(Color::Magenta),
                bold(Color::Cyan),
            ],
            code: Style::default().fg(Color::Indexed(245)),
            inline_code: bold(Color::Red),
            quote: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::ITALIC),
            rule: Style::default().fg(Color::Indexed(240)),
            image: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),
            link: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            gutter: Style::default().fg(Color::DarkGray),
            search_match: Style::default().bg(Color::Yellow).fg(Color::Black),
            current_match: Style::default()
                .bg(Color::LightRed)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status: Style::default().bg(Color::DarkGray).fg(Color::White),
            search_bar: Style::default().bg(Color::Blue).fg(Color::White),
            toast_info: Style::default().bg(Color::DarkGray).fg(Color::White),
            toast_error: Style::default().bg(Color::Red).fg(Color::White),
        }
    }

    pub fn light() -> Self {
        let bold = |color| Style::default().fg(color).add_modifier(Modifier::BOLD);
        Self {
            headings: [
                bold(Color::Indexed(24)).add_modifier(Modifier::UNDERLINED),
                bold(Color::Indexed(22)),
                bold(Color::Indexed(58)),
                bold(Color::Indexed(25)),
                bold(Color::Indexed(54)),
                bold(Color::Indexed(24)),
            ],
            code: Style::default().fg(Color::Indexed(238)),
            inline_code: bold(Color::Indexed(88)),
            quote: Style::default()
                .fg(Color::Indexed(24))
                .add_modifier(Modifier::ITALIC),
            rule: Style::default().fg(Color::Indexed(245)),
            image: Style::default()
                .fg(Color::Indexed(90))
                .add_modifier(Modifier::ITALIC),
            link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            gutter: Style::default().fg(Color::Indexed(245)),
            search_match: Style::default().bg(Color::Indexed(229)).fg(Color::Black),
            current_match: Style::default()
                .bg(Color::Indexed(214))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status: Style::default()
                .bg(Color::Indexed(252))
                .fg(Color::Indexed(235)),
            search_bar: Style::default().bg(Color::Indexed(25)).fg(Color::White),
            toast_info: Style::default()
                .bg(Color::Indexed(252))
                .fg(Color::Indexed(235)),
            toast_error: Style::default().bg(Color::Indexed(124)).fg(Color::White),
        }
    }

    /// Base style for every span on a line of this type.
    pub fn line_style(&self, line_type: LineType) -> Style {
        match line_type {
            LineType::Heading(level) => {
                let idx = usize::from(level.clamp(1, 6)) - 1;
                self.headings[idx]
            }
            LineType::CodeBlock => self.code,
            LineType::BlockQuote => self.quote,
            LineType::HorizontalRule => self.rule,
            LineType::Image => self.image,
            LineType::ListItem(_)
            | LineType::Table
            | LineType::Paragraph
            | LineType::Text
            | LineType::Empty => Style::default(),
        }
    }

    /// Layer inline flags over a line's base style.
    pub fn span_style(&self, base: Style, inline: InlineStyle) -> Style {
        let mut style = base;
        if let Some(fg) = inline.fg {
            style = style.fg(terminal_color(fg));
        }
        if let Some(bg) = inline.bg {
            style = style.bg(terminal_color(bg));
        }
        if inline.emphasis {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if inline.strong {
            style = style.add_modifier(Modifier::BOLD);
        }
        if inline.strikethrough {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        if inline.link {
            style = style.patch(self.link);
        }
        if inline.image {
            style = style.patch(self.image);
        }
        // Code block tokens carry their own color; bare inline code does not.
        if inline.code && inline.fg.is_none() && inline.token.is_none() && base != self.code {
            style = style.patch(self.inline_code);
        }
        style
    }
}

fn terminal_color(color: InlineColor) -> Color {
    if supports_truecolor() {
        Color::Rgb(color.r, color.g, color.b)
    } else {
        Color::Indexed(rgb_to_xterm_256(color.r, color.g, color.b))
    }
}

fn supports_truecolor() -> bool {
    if let Ok(force) = std::env::var("RICHVIEW_TRUECOLOR") {
        return matches!(
            force.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
    truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    let has = |value: Option<&str>, needles: &[&str]| {
        value.is_some_and(|v| {
            let lower = v.to_ascii_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    };
    has(colorterm, &["truecolor", "24bit"]) || has(term, &["direct", "truecolor"])
}

fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    // 0..=5, always fits
    #[allow(clippy::cast_possible_truncation)]
    let level = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}
