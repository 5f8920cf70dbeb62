//! Layout engine.
//!
//! Places parsed [`MarkdownElement`]s onto fixed-width display lines:
//! word wrapping with hanging indents, list markers, quote prefixes, framed
//! code blocks and bordered tables. Besides the lines, a [`Layout`] records
//! where headings, links and images ended up so the viewer can navigate and
//! hit-test them.

mod table;
mod wrap;

use std::collections::HashMap;

use crate::document::{
    HeadingRef, ImageRef, InlineSpan, InlineStyle, LineType, LinkRef, LinkRegion, ListItem,
    MarkdownElement, RenderedLine,
};
use crate::highlight::CodeStyler;

pub use wrap::display_width;

use wrap::{chunk_spans, expand_tabs, spans_width, split_at_width, truncate_spans, wrap_spans};

const CODE_RIGHT_PADDING: usize = 1;
const HEADING_GAP: usize = 2;

/// Inputs that shape the line buffer. Any change requires a relayout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Available columns (values below 1 are treated as 1)
    pub width: usize,
    pub tab_size: usize,
    pub word_wrap: bool,
    pub bullet: char,
    /// Prefix repeated once per blockquote nesting level
    pub quote_prefix: String,
    /// Vertical table rule; an ASCII char selects a `+-|` frame
    pub table_border: char,
    pub hyperlinks: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 80,
            tab_size: 4,
            word_wrap: true,
            bullet: '•',
            quote_prefix: "│ ".to_string(),
            table_border: '│',
            hyperlinks: true,
        }
    }
}

/// Result of laying out a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub lines: Vec<RenderedLine>,
    pub headings: Vec<HeadingRef>,
    pub links: Vec<LinkRef>,
    pub images: Vec<ImageRef>,
    /// First display line of each top-level element
    pub element_lines: Vec<usize>,
}

/// Lay out `elements` at `options.width`, styling code blocks with `styler`.
pub fn layout(
    elements: &[MarkdownElement],
    options: &LayoutOptions,
    styler: &mut dyn CodeStyler,
) -> Layout {
    let _scope = crate::perf::scope("layout");
    let width = options.width.max(1);
    let mut builder = Builder::new(options, styler, width);
    let mut element_lines = Vec::with_capacity(elements.len());

    for element in elements {
        let start = builder.lines.len();
        builder.push_element(element);
        let first = builder.lines[start..]
            .iter()
            .position(|line| line.line_type() != &LineType::Empty)
            .map_or(start, |offset| start + offset);
        element_lines.push(first);
    }

    let Builder {
        mut lines,
        headings,
        mut images,
        ..
    } = builder;
    trim_trailing_empty_lines(&mut lines);
    let last_line = lines.len().saturating_sub(1);
    for line in &mut element_lines {
        *line = (*line).min(last_line);
    }

    if options.word_wrap {
        clamp_lines(&mut lines, width);
    }

    let (links, inline_images) = collect_targets(&lines);
    images.extend(inline_images);
    images.sort_by_key(|image| image.line);

    tracing::debug!(
        elements = elements.len(),
        lines = lines.len(),
        width,
        wrap = options.word_wrap,
        "layout complete"
    );

    Layout {
        lines,
        headings,
        links,
        images,
        element_lines,
    }
}

struct Builder<'a, 's> {
    options: &'a LayoutOptions,
    styler: &'a mut (dyn CodeStyler + 's),
    width: usize,
    lines: Vec<RenderedLine>,
    headings: Vec<HeadingRef>,
    images: Vec<ImageRef>,
}

impl<'a, 's> Builder<'a, 's> {
    fn new(options: &'a LayoutOptions, styler: &'a mut (dyn CodeStyler + 's), width: usize) -> Self {
        Self {
            options,
            styler,
            width,
            lines: Vec::new(),
            headings: Vec::new(),
            images: Vec::new(),
        }
    }

    fn wrap_width(&self) -> Option<usize> {
        self.options.word_wrap.then_some(self.width)
    }

    fn push_element(&mut self, element: &MarkdownElement) {
        match element {
            MarkdownElement::Text(text) => {
                for raw_line in text.lines() {
                    self.push_wrapped(&[plain(raw_line)], LineType::Text, "", "");
                }
                self.push_blank();
            }
            MarkdownElement::Heading { level, content } => {
                if !self.lines.is_empty() {
                    self.ensure_trailing_empty_lines(HEADING_GAP);
                }
                let line = self.lines.len();
                self.headings.push(HeadingRef {
                    level: *level,
                    text: element.content(),
                    line,
                });
                let prefix = format!("{} ", "#".repeat(usize::from(*level)));
                let hanging = " ".repeat(prefix.len());
                self.push_wrapped(content, LineType::Heading(*level), &prefix, &hanging);
                self.push_blank();
            }
            MarkdownElement::Paragraph { content } => {
                self.push_wrapped(content, LineType::Paragraph, "", "");
                self.push_blank();
            }
            MarkdownElement::CodeBlock { language, code } => {
                self.push_code_block(language.as_deref(), code);
                self.push_blank();
            }
            MarkdownElement::List {
                ordered,
                start,
                items,
            } => {
                self.push_list(*ordered, *start, items, 0);
                self.push_blank();
            }
            MarkdownElement::Table {
                alignments,
                header,
                rows,
            } => {
                let max_width = self.wrap_width();
                for spans in table::render_table(
                    alignments,
                    header.as_deref(),
                    rows,
                    self.options.table_border,
                    max_width,
                ) {
                    self.lines.push(RenderedLine::from_spans(LineType::Table, spans));
                }
                self.push_blank();
            }
            MarkdownElement::Link { text, url, link_id } => {
                let mut style = InlineStyle::default();
                style.link = true;
                let span = InlineSpan::with_link(
                    text.clone(),
                    style,
                    crate::document::InlineLink {
                        id: *link_id,
                        url: url.clone(),
                    },
                );
                self.push_wrapped(&[span], LineType::Paragraph, "", "");
                self.push_blank();
            }
            MarkdownElement::Image { alt, src } => {
                let label = if alt.is_empty() { src } else { alt };
                let mut style = InlineStyle::default();
                style.image = true;
                self.images.push(ImageRef {
                    alt: alt.clone(),
                    src: src.clone(),
                    line: self.lines.len(),
                });
                let span = InlineSpan::new(format!("[Image: {label}]"), style);
                self.push_wrapped(&[span], LineType::Image, "", "");
                self.push_blank();
            }
            MarkdownElement::BlockQuote { children } => {
                let prefix = self.options.quote_prefix.clone();
                self.push_nested(children, &prefix, true);
                self.push_blank();
            }
            MarkdownElement::ThematicBreak => {
                let rule = "─".repeat(self.width);
                self.lines
                    .push(RenderedLine::new(rule, LineType::HorizontalRule));
                self.push_blank();
            }
        }
    }

    fn push_wrapped(
        &mut self,
        spans: &[InlineSpan],
        line_type: LineType,
        prefix_first: &str,
        prefix_next: &str,
    ) {
        let spans = self.prepare_spans(spans, display_width(prefix_first));
        for line in wrap_spans(&spans, self.wrap_width(), prefix_first, prefix_next) {
            self.lines.push(RenderedLine::from_spans(line_type, line));
        }
    }

    /// Expand tabs and drop hyperlink targets when links are disabled.
    fn prepare_spans(&self, spans: &[InlineSpan], start_column: usize) -> Vec<InlineSpan> {
        let spans = expand_tabs(spans, self.options.tab_size, start_column);
        if self.options.hyperlinks {
            return spans;
        }
        spans
            .into_iter()
            .map(|span| {
                if span.style().image {
                    span
                } else {
                    span.without_link()
                }
            })
            .collect()
    }

    fn push_code_block(&mut self, language: Option<&str>, code: &str) {
        let styled = self.styler.style_code(language, code);
        let body: Vec<Vec<InlineSpan>> = styled
            .iter()
            .map(|line| expand_tabs(line, self.options.tab_size, 0))
            .collect();

        let natural = body.iter().map(|line| spans_width(line)).max().unwrap_or(0);
        let content_width = if self.options.word_wrap {
            natural.min(self.width.saturating_sub(4 + CODE_RIGHT_PADDING))
        } else {
            natural
        }
        .max(1);

        let inner_width = content_width + 2 + CODE_RIGHT_PADDING;
        let label = format!(" {} ", language.unwrap_or("code"));
        let (visible_label, _) = split_at_width(&label, inner_width);
        let top = format!(
            "┌{}{}┐",
            visible_label,
            "─".repeat(inner_width.saturating_sub(display_width(&visible_label)))
        );
        self.lines.push(RenderedLine::new(top, LineType::CodeBlock));

        for line in &body {
            let chunks = if self.options.word_wrap {
                chunk_spans(line, content_width)
            } else {
                vec![line.clone()]
            };
            for chunk in chunks {
                let padding = content_width.saturating_sub(spans_width(&chunk)) + CODE_RIGHT_PADDING;
                let mut spans = Vec::with_capacity(chunk.len() + 2);
                spans.push(plain("│ "));
                spans.extend(chunk);
                spans.push(InlineSpan::new(
                    format!("{} │", " ".repeat(padding)),
                    InlineStyle::default(),
                ));
                self.lines
                    .push(RenderedLine::from_spans(LineType::CodeBlock, spans));
            }
        }

        self.lines.push(RenderedLine::new(
            format!("└{}┘", "─".repeat(inner_width)),
            LineType::CodeBlock,
        ));
    }

    fn push_list(&mut self, ordered: bool, start: usize, items: &[ListItem], depth: usize) {
        let indent = "  ".repeat(depth);
        let max_number = start + items.len().saturating_sub(1);
        let number_width = max_number.to_string().len();
        let line_type = LineType::ListItem(depth);

        for (index, item) in items.iter().enumerate() {
            let marker = match item.task {
                Some(true) => "✓ ".to_string(),
                Some(false) => "□ ".to_string(),
                None if ordered => format!("{:>number_width$}. ", start + index),
                None => format!("{} ", self.options.bullet),
            };
            let prefix_first = format!("{indent}{marker}");
            let prefix_next = format!("{indent}{}", " ".repeat(display_width(&marker)));

            self.push_wrapped(&item.content, line_type, &prefix_first, &prefix_next);
            for paragraph in &item.continuation {
                self.lines.push(RenderedLine::from_spans(line_type, Vec::new()));
                self.push_wrapped(paragraph, line_type, &prefix_next, &prefix_next);
            }
            for child in &item.children {
                match child {
                    MarkdownElement::List {
                        ordered,
                        start,
                        items,
                    } => self.push_list(*ordered, *start, items, depth + 1),
                    other => self.push_nested(std::slice::from_ref(other), &prefix_next, false),
                }
            }
        }
    }

    /// Lay out `elements` in a narrower column and prefix every line.
    fn push_nested(&mut self, elements: &[MarkdownElement], prefix: &str, quote: bool) {
        let prefix_width = display_width(prefix);
        let mut inner = Builder::new(
            self.options,
            &mut *self.styler,
            self.width.saturating_sub(prefix_width).max(1),
        );
        for element in elements {
            inner.push_element(element);
        }
        let Builder {
            mut lines,
            headings,
            images,
            ..
        } = inner;
        trim_trailing_empty_lines(&mut lines);

        let base = self.lines.len();
        self.headings.extend(headings.into_iter().map(|heading| HeadingRef {
            line: heading.line + base,
            ..heading
        }));
        self.images.extend(images.into_iter().map(|image| ImageRef {
            line: image.line + base,
            ..image
        }));

        for line in lines {
            if line.spans().is_empty() && !quote {
                self.lines.push(RenderedLine::empty());
                continue;
            }
            let line_type = match line.line_type() {
                LineType::Paragraph | LineType::Text | LineType::Empty if quote => {
                    LineType::BlockQuote
                }
                other => *other,
            };
            let lead = if line.spans().is_empty() {
                prefix.trim_end()
            } else {
                prefix
            };
            let mut spans = Vec::with_capacity(line.spans().len() + 1);
            if !lead.is_empty() {
                spans.push(plain(lead));
            }
            spans.extend(line.spans().iter().cloned());
            self.lines.push(RenderedLine::from_spans(line_type, spans));
        }
    }

    fn push_blank(&mut self) {
        self.lines.push(RenderedLine::empty());
    }

    fn ensure_trailing_empty_lines(&mut self, count: usize) {
        let existing = self
            .lines
            .iter()
            .rev()
            .take_while(|line| line.line_type() == &LineType::Empty)
            .count();
        for _ in existing..count {
            self.push_blank();
        }
    }
}

fn plain(text: &str) -> InlineSpan {
    InlineSpan::new(text.to_string(), InlineStyle::default())
}

fn trim_trailing_empty_lines(lines: &mut Vec<RenderedLine>) {
    while lines
        .last()
        .is_some_and(|line| line.line_type() == &LineType::Empty)
    {
        lines.pop();
    }
}

fn clamp_lines(lines: &mut [RenderedLine], width: usize) {
    for line in lines.iter_mut() {
        if line.width() > width {
            let spans = truncate_spans(line.spans(), width);
            *line = RenderedLine::from_spans(*line.line_type(), spans);
        }
    }
}

/// Walk the final lines and gather link hit regions and inline images.
fn collect_targets(lines: &[RenderedLine]) -> (Vec<LinkRef>, Vec<ImageRef>) {
    let mut targets: Vec<(LinkRef, bool)> = Vec::new();
    let mut by_id: HashMap<usize, usize> = HashMap::new();

    for (line_idx, line) in lines.iter().enumerate() {
        let mut column = 0usize;
        for span in line.spans() {
            let width = display_width(span.text());
            if let Some(target) = span.link() {
                let idx = *by_id.entry(target.id).or_insert_with(|| {
                    targets.push((
                        LinkRef {
                            text: String::new(),
                            url: target.url.clone(),
                            line: line_idx,
                            regions: Vec::new(),
                        },
                        span.style().image,
                    ));
                    targets.len() - 1
                });
                let link = &mut targets[idx].0;
                match link.regions.last_mut() {
                    Some(region) if region.line == line_idx && region.columns.end == column => {
                        region.columns.end = column + width;
                    }
                    last => {
                        let new_line = last.is_some_and(|region| region.line != line_idx);
                        if new_line && !link.text.is_empty() {
                            link.text.push(' ');
                        }
                        link.regions.push(LinkRegion {
                            line: line_idx,
                            columns: column..column + width,
                        });
                    }
                }
                link.text.push_str(span.text());
            }
            column += width;
        }
    }

    let mut links = Vec::new();
    let mut images = Vec::new();
    for (link, is_image) in targets {
        if is_image {
            let alt = link
                .text
                .strip_prefix("[Image: ")
                .and_then(|rest| rest.strip_suffix(']'))
                .unwrap_or(&link.text)
                .to_string();
            images.push(ImageRef {
                alt,
                src: link.url,
                line: link.line,
            });
        } else {
            links.push(link);
        }
    }
    (links, images)
}
