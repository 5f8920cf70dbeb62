//! Markdown document parsing and rendering.
//!
//! This module handles:
//! - Parsing markdown with comrak into [`MarkdownElement`]s
//! - The [`Document`] that lays them out for a viewport
//! - Extracting document structure (headings, links, images)

mod parser;
mod rich_text;
mod types;

pub use parser::parse;
pub use rich_text::{Document, normalize_anchor};
pub(crate) use types::spans_to_string;
pub use types::{
    Alignment, ElementKind, HeadingRef, ImageRef, InlineColor, InlineLink, InlineSpan,
    InlineStyle, LineType, LinkRef, LinkRegion, ListItem, MarkdownElement, RenderedLine,
    TokenClass,
};

use std::path::Path;

/// Prepare file content for rendering based on its extension.
///
/// Source files with a recognized extension are wrapped in a fenced code
/// block so they render with syntax highlighting. Markdown and unrecognized
/// files pass through unchanged.
pub fn prepare_content(file_path: &Path, content: String) -> String {
    let Some(language) = crate::highlight::language_for_path(file_path) else {
        return content;
    };
    let fence = "`".repeat(longest_backtick_run(&content).max(2) + 1);
    format!("{fence}{language}\n{content}\n{fence}")
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for ch in text.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RichTextOptions;

    #[test]
    fn test_prepare_content_wraps_rust_file() {
        let content = "fn main() {}".to_string();
        let result = prepare_content(Path::new("main.rs"), content);
        assert!(result.starts_with("```rs\n"), "should start with rs fence");
        assert!(result.ends_with("\n```"), "should end with closing fence");
        assert!(
            result.contains("fn main() {}"),
            "should contain original code"
        );
    }

    #[test]
    fn test_prepare_content_passes_markdown_through() {
        let content = "# Hello\nworld".to_string();
        let result = prepare_content(Path::new("README.md"), content.clone());
        assert_eq!(
            result, content,
            "Markdown content should pass through unchanged"
        );
    }

    #[test]
    fn test_prepare_content_passes_unknown_through() {
        let content = "some data".to_string();
        let result = prepare_content(Path::new("data.xyz"), content.clone());
        assert_eq!(
            result, content,
            "Unknown extension should pass through unchanged"
        );
    }

    #[test]
    fn test_prepare_content_lengthens_fence_around_backticks() {
        let content = "s = \"```\"".to_string();
        let result = prepare_content(Path::new("script.py"), content);
        assert!(result.starts_with("````py\n"));

        let doc = Document::with_content(result, RichTextOptions::default());
        assert_eq!(doc.elements().len(), 1);
        assert!(doc.plain_text().contains("s = \"```\""));
    }
}
