//! Markdown parsing with comrak.

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};

use super::types::{
    Alignment, InlineLink, InlineSpan, InlineStyle, ListItem, MarkdownElement,
};

/// Parse markdown source into an ordered sequence of elements.
///
/// Parsing never fails: constructs comrak cannot interpret are kept as
/// literal text. The same input always yields the same elements.
///
/// # Example
///
/// ```
/// use richview::document::{parse, ElementKind};
///
/// let elements = parse("# Title\n\nHello world");
/// assert_eq!(elements.len(), 2);
/// assert_eq!(elements[0].kind(), ElementKind::Heading);
/// assert_eq!(elements[1].content(), "Hello world");
/// ```
pub fn parse(source: &str) -> Vec<MarkdownElement> {
    let _scope = crate::perf::scope("document.parse");
    let arena = Arena::new();
    let mut options = Options::default();
    enable_extensions(&mut options);
    let root = parse_document(&arena, source, &options);

    let mut ctx = ParseContext::default();
    let elements = collect_blocks(root, &mut ctx);
    tracing::debug!(
        bytes = source.len(),
        elements = elements.len(),
        links = ctx.next_link_id,
        "parsed markdown"
    );
    elements
}

fn enable_extensions(options: &mut Options) {
    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
}

#[derive(Debug, Default)]
struct ParseContext {
    next_link_id: usize,
}

impl ParseContext {
    fn link(&mut self, url: &str) -> InlineLink {
        let id = self.next_link_id;
        self.next_link_id += 1;
        InlineLink {
            id,
            url: url.to_string(),
        }
    }
}

fn collect_blocks<'a>(parent: &'a AstNode<'a>, ctx: &mut ParseContext) -> Vec<MarkdownElement> {
    let mut out = Vec::new();
    for child in parent.children() {
        push_block(child, ctx, &mut out);
    }
    out
}

fn push_block<'a>(node: &'a AstNode<'a>, ctx: &mut ParseContext, out: &mut Vec<MarkdownElement>) {
    match &node.data.borrow().value {
        NodeValue::Heading(heading) => {
            out.push(MarkdownElement::Heading {
                level: heading.level.clamp(1, 6),
                content: collect_inline_spans(node, ctx),
            });
        }

        NodeValue::Paragraph => push_paragraph(node, ctx, out),

        NodeValue::CodeBlock(code_block) => {
            let language = code_block
                .info
                .split_whitespace()
                .next()
                .filter(|s| !s.is_empty())
                .map(ToString::to_string);
            let literal = &code_block.literal;
            let code = literal.strip_suffix('\n').unwrap_or(literal).to_string();
            out.push(MarkdownElement::CodeBlock { language, code });
        }

        NodeValue::List(list) => {
            let items = node.children().map(|item| list_item(item, ctx)).collect();
            out.push(MarkdownElement::List {
                ordered: matches!(list.list_type, ListType::Ordered),
                start: list.start,
                items,
            });
        }

        NodeValue::Table(table) => {
            let alignments = table.alignments.iter().copied().map(alignment).collect();
            let (header, rows) = collect_table_rows(node);
            out.push(MarkdownElement::Table {
                alignments,
                header,
                rows,
            });
        }

        NodeValue::BlockQuote => {
            out.push(MarkdownElement::BlockQuote {
                children: collect_blocks(node, ctx),
            });
        }

        NodeValue::ThematicBreak => out.push(MarkdownElement::ThematicBreak),

        NodeValue::HtmlBlock(html) => {
            let text = html.literal.trim_end_matches('\n');
            if !text.is_empty() {
                out.push(MarkdownElement::Text(text.to_string()));
            }
        }

        NodeValue::FootnoteDefinition(def) => {
            let mut content = vec![InlineSpan::new(
                format!("[^{}]: ", def.name),
                InlineStyle::default(),
            )];
            for child in node.children() {
                if content.len() > 1 {
                    content.push(InlineSpan::new(" ".to_string(), InlineStyle::default()));
                }
                content.extend(collect_inline_spans(child, ctx));
            }
            out.push(MarkdownElement::Paragraph { content });
        }

        _ => {
            // Process children for unhandled nodes
            for child in node.children() {
                push_block(child, ctx, out);
            }
        }
    }
}

fn push_paragraph<'a>(node: &'a AstNode<'a>, ctx: &mut ParseContext, out: &mut Vec<MarkdownElement>) {
    if let Some(images) = paragraph_only_images(node) {
        out.extend(
            images
                .into_iter()
                .map(|(alt, src)| MarkdownElement::Image { alt, src }),
        );
        return;
    }

    if let Some(link_node) = paragraph_only_link(node) {
        if let NodeValue::Link(link) = &link_node.data.borrow().value {
            let target = ctx.link(&link.url);
            out.push(MarkdownElement::Link {
                text: extract_text(link_node),
                url: target.url,
                link_id: target.id,
            });
            return;
        }
    }

    out.push(MarkdownElement::Paragraph {
        content: collect_inline_spans(node, ctx),
    });
}

fn list_item<'a>(node: &'a AstNode<'a>, ctx: &mut ParseContext) -> ListItem {
    let mut item = ListItem::default();
    if let NodeValue::TaskItem(symbol) = &node.data.borrow().value {
        item.task = Some(symbol.is_some());
    }

    let mut paragraphs = 0usize;
    for child in node.children() {
        let is_paragraph = matches!(child.data.borrow().value, NodeValue::Paragraph);
        if is_paragraph {
            let spans = collect_inline_spans(child, ctx);
            if paragraphs == 0 {
                item.content = spans;
            } else {
                item.continuation.push(spans);
            }
            paragraphs += 1;
        } else {
            push_block(child, ctx, &mut item.children);
        }
    }
    item
}

const fn alignment(value: TableAlignment) -> Alignment {
    match value {
        TableAlignment::None => Alignment::None,
        TableAlignment::Left => Alignment::Left,
        TableAlignment::Center => Alignment::Center,
        TableAlignment::Right => Alignment::Right,
    }
}

fn collect_table_rows<'a>(table_node: &'a AstNode<'a>) -> (Option<Vec<String>>, Vec<Vec<String>>) {
    let mut header = None;
    let mut rows = Vec::new();
    for row_node in table_node.children() {
        let is_header = match row_node.data.borrow().value {
            NodeValue::TableRow(is_header) => is_header,
            _ => continue,
        };

        let cells: Vec<String> = row_node
            .children()
            .filter(|cell| matches!(cell.data.borrow().value, NodeValue::TableCell))
            .map(|cell| {
                extract_text(cell)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        if is_header && header.is_none() {
            header = Some(cells);
        } else {
            rows.push(cells);
        }
    }
    (header, rows)
}

/// Returns the images of a paragraph that contains nothing but images.
fn paragraph_only_images<'a>(node: &'a AstNode<'a>) -> Option<Vec<(String, String)>> {
    let mut images = Vec::new();
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Image(image) => images.push((extract_text(child), image.url.clone())),
            NodeValue::SoftBreak | NodeValue::LineBreak => {}
            NodeValue::Text(t) if t.trim().is_empty() => {}
            _ => return None,
        }
    }
    if images.is_empty() { None } else { Some(images) }
}

fn paragraph_only_link<'a>(node: &'a AstNode<'a>) -> Option<&'a AstNode<'a>> {
    let mut found = None;
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Link(_) if found.is_none() => found = Some(child),
            NodeValue::Text(t) if t.trim().is_empty() => {}
            _ => return None,
        }
    }
    found
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => {
            text.push_str(t);
        }
        NodeValue::Code(c) => {
            text.push_str(&c.literal);
        }
        NodeValue::HtmlInline(html) => {
            text.push_str(html);
        }
        NodeValue::FootnoteReference(reference) => {
            text.push_str(&format!("[^{}]", reference.name));
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            text.push(' ');
        }
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

fn collect_inline_spans<'a>(node: &'a AstNode<'a>, ctx: &mut ParseContext) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    for child in node.children() {
        collect_inline_spans_recursive(child, InlineStyle::default(), None, ctx, &mut spans);
    }
    spans
}

fn collect_inline_spans_recursive<'a>(
    node: &'a AstNode<'a>,
    style: InlineStyle,
    link: Option<&InlineLink>,
    ctx: &mut ParseContext,
    spans: &mut Vec<InlineSpan>,
) {
    let push = |spans: &mut Vec<InlineSpan>, text: String, style: InlineStyle| {
        let span = match link {
            Some(link) => InlineSpan::with_link(text, style, link.clone()),
            None => InlineSpan::new(text, style),
        };
        spans.push(span);
    };

    match &node.data.borrow().value {
        NodeValue::List(_) | NodeValue::Item(_) | NodeValue::TaskItem(_) => {}
        NodeValue::Text(t) => push(spans, t.clone(), style),
        NodeValue::Code(code) => {
            let mut code_style = style;
            code_style.code = true;
            code_style.emphasis = false;
            code_style.strong = false;
            code_style.strikethrough = false;
            push(spans, code.literal.clone(), code_style);
        }
        NodeValue::HtmlInline(html) => push(spans, html.clone(), style),
        NodeValue::Emph => {
            let mut next = style;
            next.emphasis = true;
            for child in node.children() {
                collect_inline_spans_recursive(child, next, link, ctx, spans);
            }
        }
        NodeValue::Strong => {
            let mut next = style;
            next.strong = true;
            for child in node.children() {
                collect_inline_spans_recursive(child, next, link, ctx, spans);
            }
        }
        NodeValue::Strikethrough => {
            let mut next = style;
            next.strikethrough = true;
            for child in node.children() {
                collect_inline_spans_recursive(child, next, link, ctx, spans);
            }
        }
        NodeValue::Link(target) => {
            let mut next = style;
            next.link = true;
            let target = ctx.link(&target.url);
            for child in node.children() {
                collect_inline_spans_recursive(child, next, Some(&target), ctx, spans);
            }
        }
        NodeValue::Image(image) => {
            let alt = extract_text(node);
            let label = if alt.is_empty() { &image.url } else { &alt };
            let mut image_style = style;
            image_style.image = true;
            let target = ctx.link(&image.url);
            spans.push(InlineSpan::with_link(
                format!("[Image: {label}]"),
                image_style,
                target,
            ));
        }
        NodeValue::FootnoteReference(reference) => {
            push(spans, format!("[^{}]", reference.name), style);
        }
        NodeValue::SoftBreak => push(spans, " ".to_string(), style),
        NodeValue::LineBreak => push(spans, "\n".to_string(), style),
        _ => {
            for child in node.children() {
                collect_inline_spans_recursive(child, style, link, ctx, spans);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ElementKind;

    #[test]
    fn test_parse_empty_document() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_title_and_paragraph() {
        let elements = parse("# Title\n\nHello world");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].heading_level(), Some(1));
        assert_eq!(elements[0].content(), "Title");
        assert_eq!(elements[1].kind(), ElementKind::Paragraph);
        assert_eq!(elements[1].content(), "Hello world");
    }

    #[test]
    fn test_parse_multiple_headings() {
        let elements = parse("# One\n\n## Two\n\n###### Six");
        let levels: Vec<_> = elements.iter().filter_map(MarkdownElement::heading_level).collect();
        assert_eq!(levels, vec![1, 2, 6]);
    }

    #[test]
    fn test_seven_hashes_is_not_a_heading() {
        let elements = parse("####### Seven");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind(), ElementKind::Paragraph);
        assert_eq!(elements[0].content(), "####### Seven");
    }

    #[test]
    fn test_parse_code_block_with_language() {
        let elements = parse("```rust\nfn main() {}\n```");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].language(), Some("rust"));
        assert_eq!(elements[0].content(), "fn main() {}");
    }

    #[test]
    fn test_code_block_info_string_keeps_first_word() {
        let elements = parse("```python title=\"x\"\nprint(1)\n```");
        assert_eq!(elements[0].language(), Some("python"));
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let elements = parse("```\nlet x = 1;\nstill code");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind(), ElementKind::CodeBlock);
        assert_eq!(elements[0].language(), None);
        assert!(elements[0].content().contains("still code"));
    }

    #[test]
    fn test_parse_nested_list() {
        let elements = parse("- Parent\n  - Child\n- Sibling");
        let MarkdownElement::List { ordered, items, .. } = &elements[0] else {
            panic!("expected list, got {:?}", elements[0]);
        };
        assert!(!ordered);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].children.len(), 1);
        assert_eq!(items[0].children[0].kind(), ElementKind::List);
        assert_eq!(items[0].children[0].content(), "Child");
    }

    #[test]
    fn test_parse_ordered_list_start() {
        let elements = parse("3. Three\n4. Four");
        let MarkdownElement::List { ordered, start, .. } = &elements[0] else {
            panic!("expected list");
        };
        assert!(ordered);
        assert_eq!(*start, 3);
    }

    #[test]
    fn test_task_items_carry_state() {
        let elements = parse("- [x] Done\n- [ ] Todo");
        let MarkdownElement::List { items, .. } = &elements[0] else {
            panic!("expected list");
        };
        assert_eq!(items[0].task, Some(true));
        assert_eq!(items[1].task, Some(false));
        assert_eq!(crate::document::types::spans_to_string(&items[0].content), "Done");
    }

    #[test]
    fn test_parse_table_alignments() {
        let elements = parse("| A | B | C |\n|:--|:-:|--:|\n| 1 | 2 | 3 |");
        let MarkdownElement::Table {
            alignments,
            header,
            rows,
        } = &elements[0]
        else {
            panic!("expected table");
        };
        assert_eq!(
            alignments,
            &vec![Alignment::Left, Alignment::Center, Alignment::Right]
        );
        assert_eq!(header.as_deref(), Some(["A".to_string(), "B".to_string(), "C".to_string()].as_slice()));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_table_without_separator_is_text() {
        let elements = parse("| A | B |\n| 1 | 2 |");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind(), ElementKind::Paragraph);
    }

    #[test]
    fn test_parse_blockquote_children() {
        let elements = parse("> quoted\n>\n> > deeper");
        let MarkdownElement::BlockQuote { children } = &elements[0] else {
            panic!("expected quote");
        };
        assert_eq!(children[0].content(), "quoted");
        assert_eq!(children[1].kind(), ElementKind::BlockQuote);
    }

    #[test]
    fn test_standalone_link_becomes_link_element() {
        let elements = parse("[Click here](https://example.com)");
        assert_eq!(elements[0].kind(), ElementKind::Link);
        assert_eq!(elements[0].content(), "Click here");
        assert_eq!(elements[0].link_target(), Some("https://example.com"));
    }

    #[test]
    fn test_standalone_image_becomes_image_element() {
        let elements = parse("![Alt text](image.png)");
        assert_eq!(elements[0].kind(), ElementKind::Image);
        assert_eq!(elements[0].content(), "Alt text");
        assert_eq!(elements[0].link_target(), Some("image.png"));
    }

    #[test]
    fn test_inline_styles_create_spans() {
        let elements = parse("*em* **strong** `code` [link](https://example.com) ~~strike~~");
        let MarkdownElement::Paragraph { content } = &elements[0] else {
            panic!("expected paragraph");
        };
        assert!(content.iter().any(|s| s.style().emphasis));
        assert!(content.iter().any(|s| s.style().strong));
        assert!(content.iter().any(|s| s.style().code));
        assert!(content.iter().any(|s| s.style().strikethrough));
        let link = content.iter().find(|s| s.style().link).expect("link span");
        assert_eq!(link.link().map(|l| l.url.as_str()), Some("https://example.com"));
    }

    #[test]
    fn test_link_ids_are_unique_per_link() {
        let elements = parse("[a](one) and [b](two)");
        let MarkdownElement::Paragraph { content } = &elements[0] else {
            panic!("expected paragraph");
        };
        let ids: Vec<_> = content.iter().filter_map(|s| s.link().map(|l| l.id)).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_unclosed_emphasis_is_literal() {
        let elements = parse("**not closed");
        assert_eq!(elements[0].content(), "**not closed");
    }

    #[test]
    fn test_broken_link_degrades_to_text() {
        let elements = parse("[text](missing");
        assert_eq!(elements[0].kind(), ElementKind::Paragraph);
        assert_eq!(elements[0].content(), "[text](missing");
    }

    #[test]
    fn test_hard_break_is_newline_span() {
        let elements = parse("one  \ntwo");
        assert_eq!(elements[0].content(), "one\ntwo");
    }

    #[test]
    fn test_html_block_is_text() {
        let elements = parse("<div>\nraw\n</div>");
        assert_eq!(elements[0].kind(), ElementKind::Text);
        assert!(elements[0].content().contains("raw"));
    }

    #[test]
    fn test_footnote_definition_has_label() {
        let elements = parse("Alpha[^n]\n\n[^n]: Footnote text");
        assert!(elements.iter().any(|e| e.content().contains("[^n]: Footnote text")));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let md = "# A\n\n- x\n- [y](z)\n\n```\ncode\n```";
        assert_eq!(parse(md), parse(md));
    }
}
