//! Core document types.

use std::ops::Range;

/// A parsed block of markdown.
///
/// Elements are produced by [`crate::document::parse`] and never mutated
/// afterwards; the document owns them in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownElement {
    /// Literal text that is not part of any other construct (raw HTML, stray markup)
    Text(String),
    /// ATX or setext heading with level (1-6)
    Heading { level: u8, content: Vec<InlineSpan> },
    /// Paragraph with inline styling
    Paragraph { content: Vec<InlineSpan> },
    /// Fenced or indented code block
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    /// Ordered or unordered list
    List {
        ordered: bool,
        start: usize,
        items: Vec<ListItem>,
    },
    /// Pipe table; `header` is `None` only for degenerate tables
    Table {
        alignments: Vec<Alignment>,
        header: Option<Vec<String>>,
        rows: Vec<Vec<String>>,
    },
    /// A paragraph made of a single link
    Link {
        text: String,
        url: String,
        link_id: usize,
    },
    /// A paragraph made of a single image
    Image { alt: String, src: String },
    /// Block quote with nested blocks
    BlockQuote { children: Vec<MarkdownElement> },
    /// Horizontal rule
    ThematicBreak,
}

/// Discriminant of a [`MarkdownElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Text,
    Heading,
    Paragraph,
    CodeBlock,
    List,
    Table,
    Link,
    Image,
    BlockQuote,
    ThematicBreak,
}

impl MarkdownElement {
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Text(_) => ElementKind::Text,
            Self::Heading { .. } => ElementKind::Heading,
            Self::Paragraph { .. } => ElementKind::Paragraph,
            Self::CodeBlock { .. } => ElementKind::CodeBlock,
            Self::List { .. } => ElementKind::List,
            Self::Table { .. } => ElementKind::Table,
            Self::Link { .. } => ElementKind::Link,
            Self::Image { .. } => ElementKind::Image,
            Self::BlockQuote { .. } => ElementKind::BlockQuote,
            Self::ThematicBreak => ElementKind::ThematicBreak,
        }
    }

    /// Plain-text content of the element, without markup.
    pub fn content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Heading { content, .. } | Self::Paragraph { content } => spans_to_string(content),
            Self::CodeBlock { code, .. } => code.clone(),
            Self::List { items, .. } => items
                .iter()
                .map(ListItem::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Table { header, rows, .. } => header
                .iter()
                .chain(rows.iter())
                .map(|row| row.join(" | "))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Link { text, .. } => text.clone(),
            Self::Image { alt, .. } => alt.clone(),
            Self::BlockQuote { children } => children
                .iter()
                .map(Self::content)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::ThematicBreak => String::new(),
        }
    }

    pub const fn heading_level(&self) -> Option<u8> {
        match self {
            Self::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }

    /// Declared language of a code block, if any.
    pub fn language(&self) -> Option<&str> {
        match self {
            Self::CodeBlock { language, .. } => language.as_deref(),
            _ => None,
        }
    }

    /// Link URL or image source.
    pub fn link_target(&self) -> Option<&str> {
        match self {
            Self::Link { url, .. } => Some(url),
            Self::Image { src, .. } => Some(src),
            _ => None,
        }
    }

    pub fn table_alignments(&self) -> Option<&[Alignment]> {
        match self {
            Self::Table { alignments, .. } => Some(alignments),
            _ => None,
        }
    }
}

/// One entry of a list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    /// Inline content of the item's first paragraph(s)
    pub content: Vec<InlineSpan>,
    /// Additional paragraphs inside the same item
    pub continuation: Vec<Vec<InlineSpan>>,
    /// Task state for GFM task list items
    pub task: Option<bool>,
    /// Nested blocks (sub-lists, code blocks, quotes)
    pub children: Vec<MarkdownElement>,
}

impl ListItem {
    fn plain_text(&self) -> String {
        let mut parts = vec![spans_to_string(&self.content)];
        parts.extend(self.continuation.iter().map(|p| spans_to_string(p)));
        parts.extend(self.children.iter().map(MarkdownElement::content));
        parts.retain(|p| !p.is_empty());
        parts.join("\n")
    }
}

/// Column alignment declared by a table's separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Syntax token class assigned by the highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Keyword,
    String,
    Comment,
    Number,
    Function,
    Identifier,
    Plain,
}

/// Inline style flags for a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
    pub image: bool,
    pub token: Option<TokenClass>,
    pub fg: Option<InlineColor>,
    pub bg: Option<InlineColor>,
}

/// RGB color for inline styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Link target attached to the spans of a link.
///
/// `id` is unique within one parse and keeps wrapped fragments of the same
/// link together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InlineLink {
    pub id: usize,
    pub url: String,
}

/// A styled inline span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
    link: Option<InlineLink>,
}

impl InlineSpan {
    pub const fn new(text: String, style: InlineStyle) -> Self {
        Self {
            text,
            style,
            link: None,
        }
    }

    pub const fn with_link(text: String, style: InlineStyle, link: InlineLink) -> Self {
        Self {
            text,
            style,
            link: Some(link),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }

    pub const fn link(&self) -> Option<&InlineLink> {
        self.link.as_ref()
    }

    /// Copy of this span carrying different text.
    #[must_use]
    pub fn with_text(&self, text: String) -> Self {
        Self {
            text,
            style: self.style,
            link: self.link.clone(),
        }
    }

    /// Copy of this span with link styling and target removed.
    #[must_use]
    pub fn without_link(&self) -> Self {
        let mut style = self.style;
        style.link = false;
        Self {
            text: self.text.clone(),
            style,
            link: None,
        }
    }
}

/// A single rendered line with styling information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// The text content of the line
    content: String,
    /// The type of line (for styling)
    line_type: LineType,
    /// Inline-styled spans; concatenated they equal `content`
    spans: Vec<InlineSpan>,
}

impl RenderedLine {
    /// Create a new rendered line with a single unstyled span.
    pub fn new(content: String, line_type: LineType) -> Self {
        let spans = if content.is_empty() {
            Vec::new()
        } else {
            vec![InlineSpan::new(content.clone(), InlineStyle::default())]
        };
        Self {
            content,
            line_type,
            spans,
        }
    }

    /// Create a new rendered line from inline spans.
    pub fn from_spans(line_type: LineType, spans: Vec<InlineSpan>) -> Self {
        Self {
            content: spans_to_string(&spans),
            line_type,
            spans,
        }
    }

    pub const fn empty() -> Self {
        Self {
            content: String::new(),
            line_type: LineType::Empty,
            spans: Vec::new(),
        }
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the line type.
    pub const fn line_type(&self) -> &LineType {
        &self.line_type
    }

    pub fn spans(&self) -> &[InlineSpan] {
        &self.spans
    }

    /// Display width in terminal cells.
    pub fn width(&self) -> usize {
        unicode_width::UnicodeWidthStr::width(self.content.as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Type of a rendered line, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Normal paragraph text
    Paragraph,
    /// Heading with level (1-6)
    Heading(u8),
    /// Code block line
    CodeBlock,
    /// Block quote line
    BlockQuote,
    /// List item with nesting level
    ListItem(usize),
    /// Table row
    Table,
    /// Horizontal rule
    HorizontalRule,
    /// Image placeholder
    Image,
    /// Raw text passthrough
    Text,
    /// Empty line
    Empty,
}

/// Reference to a heading in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRef {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text (plain, no formatting)
    pub text: String,
    /// Line number in rendered document
    pub line: usize,
}

/// Reference to an image in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Alt text
    pub alt: String,
    /// Image source (path or URL)
    pub src: String,
    /// Line in rendered document
    pub line: usize,
}

/// Reference to a link in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// Link text
    pub text: String,
    /// Link URL
    pub url: String,
    /// First rendered line the link appears on
    pub line: usize,
    /// Clickable regions, one per rendered line the link spans
    pub regions: Vec<LinkRegion>,
}

impl LinkRef {
    pub fn contains(&self, line: usize, column: usize) -> bool {
        self.regions
            .iter()
            .any(|r| r.line == line && r.columns.contains(&column))
    }
}

/// Display columns a link occupies on one rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRegion {
    pub line: usize,
    pub columns: Range<usize>,
}

pub(crate) fn spans_to_string(spans: &[InlineSpan]) -> String {
    let mut content = String::new();
    for span in spans {
        content.push_str(span.text());
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> InlineSpan {
        InlineSpan::new(text.to_string(), InlineStyle::default())
    }

    #[test]
    fn test_rendered_line_content() {
        let line = RenderedLine::new("Hello".to_string(), LineType::Paragraph);
        assert_eq!(line.content(), "Hello");
        assert_eq!(line.spans().len(), 1);
    }

    #[test]
    fn test_rendered_line_type() {
        let line = RenderedLine::new("# Heading".to_string(), LineType::Heading(1));
        assert_eq!(line.line_type(), &LineType::Heading(1));
    }

    #[test]
    fn test_rendered_line_from_spans_joins_text() {
        let line = RenderedLine::from_spans(LineType::Paragraph, vec![plain("ab"), plain("cd")]);
        assert_eq!(line.content(), "abcd");
        assert_eq!(line.width(), 4);
    }

    #[test]
    fn test_empty_line_has_no_spans() {
        let line = RenderedLine::empty();
        assert!(line.spans().is_empty());
        assert!(line.is_blank());
    }

    #[test]
    fn test_element_accessors() {
        let heading = MarkdownElement::Heading {
            level: 2,
            content: vec![plain("Intro")],
        };
        assert_eq!(heading.kind(), ElementKind::Heading);
        assert_eq!(heading.heading_level(), Some(2));
        assert_eq!(heading.content(), "Intro");
        assert_eq!(heading.language(), None);

        let code = MarkdownElement::CodeBlock {
            language: Some("rust".to_string()),
            code: "fn main() {}".to_string(),
        };
        assert_eq!(code.language(), Some("rust"));
        assert_eq!(code.content(), "fn main() {}");

        let link = MarkdownElement::Link {
            text: "docs".to_string(),
            url: "https://example.com".to_string(),
            link_id: 0,
        };
        assert_eq!(link.link_target(), Some("https://example.com"));
    }

    #[test]
    fn test_table_content_joins_cells() {
        let table = MarkdownElement::Table {
            alignments: vec![Alignment::Left, Alignment::Right],
            header: Some(vec!["A".to_string(), "B".to_string()]),
            rows: vec![vec!["1".to_string(), "2".to_string()]],
        };
        assert_eq!(table.content(), "A | B\n1 | 2");
        assert_eq!(
            table.table_alignments(),
            Some([Alignment::Left, Alignment::Right].as_slice())
        );
    }

    #[test]
    fn test_list_content_includes_nested_items() {
        let list = MarkdownElement::List {
            ordered: false,
            start: 1,
            items: vec![ListItem {
                content: vec![plain("Parent")],
                children: vec![MarkdownElement::List {
                    ordered: false,
                    start: 1,
                    items: vec![ListItem {
                        content: vec![plain("Child")],
                        ..ListItem::default()
                    }],
                }],
                ..ListItem::default()
            }],
        };
        assert_eq!(list.content(), "Parent\nChild");
    }

    #[test]
    fn test_link_region_hit_test() {
        let link = LinkRef {
            text: "here".to_string(),
            url: "u".to_string(),
            line: 3,
            regions: vec![LinkRegion {
                line: 3,
                columns: 5..9,
            }],
        };
        assert!(link.contains(3, 5));
        assert!(link.contains(3, 8));
        assert!(!link.contains(3, 9));
        assert!(!link.contains(4, 6));
    }

    #[test]
    fn test_without_link_clears_style() {
        let mut style = InlineStyle::default();
        style.link = true;
        let span = InlineSpan::with_link(
            "x".to_string(),
            style,
            InlineLink {
                id: 1,
                url: "u".to_string(),
            },
        );
        let stripped = span.without_link();
        assert!(!stripped.style().link);
        assert!(stripped.link().is_none());
    }
}
