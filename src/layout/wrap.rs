//! Span-level line breaking.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::document::{InlineSpan, InlineStyle};

pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

pub fn spans_width(spans: &[InlineSpan]) -> usize {
    spans.iter().map(|span| display_width(span.text())).sum()
}

/// Break `spans` into display lines.
///
/// `width` of `None` disables wrapping: only forced breaks (`\n` spans) start
/// a new line. With a width, lines break at whitespace and words wider than
/// the remaining room are split by display width. The first line starts with
/// `prefix_first`, later lines with `prefix_next`.
pub fn wrap_spans(
    spans: &[InlineSpan],
    width: Option<usize>,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let mut wrapper = Wrapper {
        width,
        prefix_next,
        lines: Vec::new(),
        current: Vec::new(),
        current_width: 0,
        has_word: false,
    };
    wrapper.start_line(prefix_first);

    for span in spans {
        for token in split_inline_tokens(span) {
            wrapper.push_token(token);
        }
    }

    wrapper.finish()
}

struct Wrapper<'a> {
    width: Option<usize>,
    prefix_next: &'a str,
    lines: Vec<Vec<InlineSpan>>,
    current: Vec<InlineSpan>,
    current_width: usize,
    has_word: bool,
}

impl Wrapper<'_> {
    fn start_line(&mut self, prefix: &str) {
        self.current.clear();
        self.current_width = 0;
        if !prefix.is_empty() {
            self.current
                .push(InlineSpan::new(prefix.to_string(), InlineStyle::default()));
            self.current_width = display_width(prefix);
        }
        self.has_word = false;
    }

    fn break_line(&mut self) {
        let mut line = std::mem::take(&mut self.current);
        if self.has_word {
            while line.last().is_some_and(|span| is_whitespace(span.text())) {
                line.pop();
            }
        }
        self.lines.push(line);
        let prefix = self.prefix_next;
        self.start_line(prefix);
    }

    fn push_token(&mut self, token: InlineSpan) {
        if token.text() == "\n" {
            self.break_line();
            return;
        }

        let token_width = display_width(token.text());
        let token_is_ws = is_whitespace(token.text());

        let Some(width) = self.width else {
            if token_is_ws && !self.has_word {
                return;
            }
            self.current_width += token_width;
            self.current.push(token);
            self.has_word = true;
            return;
        };

        if self.current_width + token_width > width && self.has_word {
            self.break_line();
        }

        if token_is_ws && !self.has_word {
            // Drop leading whitespace at wrapped line starts.
            return;
        }

        if !token_is_ws && self.current_width + token_width > width {
            self.split_long_word(token, width);
            return;
        }

        self.current_width += token_width;
        self.current.push(token);
        self.has_word = true;
    }

    fn split_long_word(&mut self, token: InlineSpan, width: usize) {
        let mut rest = token.text().to_string();
        while !rest.is_empty() {
            let room = width.saturating_sub(self.current_width);
            let (mut head, mut tail) = split_at_width(&rest, room);
            if head.is_empty() {
                if self.has_word {
                    self.break_line();
                    continue;
                }
                // Not even one character fits after the prefix; take one and let
                // the final clamp trim it.
                let mut chars = rest.chars();
                head = chars.next().map(String::from).unwrap_or_default();
                tail = chars.as_str().to_string();
            }
            self.current_width += display_width(&head);
            self.current.push(token.with_text(head));
            self.has_word = true;
            rest = tail;
            if !rest.is_empty() {
                self.break_line();
            }
        }
    }

    fn finish(mut self) -> Vec<Vec<InlineSpan>> {
        if self.has_word {
            while self
                .current
                .last()
                .is_some_and(|span| is_whitespace(span.text()))
            {
                self.current.pop();
            }
        }
        self.lines.push(self.current);
        self.lines
    }
}

fn is_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Split a span into alternating word and whitespace runs; `\n` is its own token.
fn split_inline_tokens(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut ws_state: Option<bool> = None;

    for ch in span.text().chars() {
        if ch == '\n' {
            if !buf.is_empty() {
                out.push(span.with_text(std::mem::take(&mut buf)));
            }
            out.push(span.with_text("\n".to_string()));
            ws_state = None;
            continue;
        }
        let is_ws = ch.is_whitespace();
        match ws_state {
            Some(state) if state == is_ws => buf.push(ch),
            Some(_) => {
                out.push(span.with_text(std::mem::take(&mut buf)));
                buf.push(ch);
                ws_state = Some(is_ws);
            }
            None => {
                buf.push(ch);
                ws_state = Some(is_ws);
            }
        }
    }

    if !buf.is_empty() {
        out.push(span.with_text(buf));
    }

    out
}

/// Longest prefix of `text` that fits in `width` cells, and the remainder.
pub fn split_at_width(text: &str, width: usize) -> (String, String) {
    let mut used = 0usize;
    for (idx, ch) in text.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width {
            return (text[..idx].to_string(), text[idx..].to_string());
        }
        used += ch_width;
    }
    (text.to_string(), String::new())
}

/// Cut spans so their combined display width is at most `max_width`.
pub fn truncate_spans(spans: &[InlineSpan], max_width: usize) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut remaining = max_width;
    for span in spans {
        if remaining == 0 {
            break;
        }
        let span_width = display_width(span.text());
        if span_width <= remaining {
            out.push(span.clone());
            remaining -= span_width;
            continue;
        }
        let (head, _) = split_at_width(span.text(), remaining);
        if !head.is_empty() {
            remaining -= display_width(&head);
            out.push(span.with_text(head));
        }
        break;
    }
    out
}

/// Hard-wrap spans into chunks of at most `width` cells, preserving styles.
pub fn chunk_spans(spans: &[InlineSpan], width: usize) -> Vec<Vec<InlineSpan>> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<InlineSpan> = Vec::new();
    let mut used = 0usize;

    for span in spans {
        let mut rest = span.text().to_string();
        while !rest.is_empty() {
            let (mut head, mut tail) = split_at_width(&rest, width - used);
            if head.is_empty() {
                if used > 0 {
                    chunks.push(std::mem::take(&mut current));
                    used = 0;
                    continue;
                }
                let mut chars = rest.chars();
                head = chars.next().map(String::from).unwrap_or_default();
                tail = chars.as_str().to_string();
            }
            used += display_width(&head);
            current.push(span.with_text(head));
            rest = tail;
            if used >= width {
                chunks.push(std::mem::take(&mut current));
                used = 0;
            }
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Replace tabs with spaces up to the next multiple of `tab_size`, counting
/// columns from `start_column`.
pub fn expand_tabs(spans: &[InlineSpan], tab_size: usize, start_column: usize) -> Vec<InlineSpan> {
    if !spans.iter().any(|span| span.text().contains('\t')) {
        return spans.to_vec();
    }
    let tab_size = tab_size.max(1);
    let mut column = start_column;
    spans
        .iter()
        .map(|span| {
            let mut text = String::with_capacity(span.text().len());
            for ch in span.text().chars() {
                if ch == '\t' {
                    let fill = tab_size - (column % tab_size);
                    text.extend(std::iter::repeat_n(' ', fill));
                    column += fill;
                } else if ch == '\n' {
                    text.push(ch);
                    column = start_column;
                } else {
                    text.push(ch);
                    column += ch.width().unwrap_or(0);
                }
            }
            span.with_text(text)
        })
        .collect()
}
