//! The [`Document`] a viewer drives.
//!
//! A document owns its source, the parsed elements, the laid-out lines, a
//! viewport and the search state. Every mutation that can change the lines
//! re-runs layout immediately, so [`Document::render`] is a cheap borrow.

use std::sync::mpsc;
use std::time::Duration;

use crate::config::RichTextOptions;
use crate::events::{DocumentId, Notification, Observers, RichTextEvent, SubscriptionId};
use crate::highlight::{HighlightCache, LanguageDetection};
use crate::layout::{self, Layout};
use crate::search::{SearchMatch, SearchState};
use crate::ui::viewport::Viewport;

use super::parser::parse;
use super::types::{HeadingRef, ImageRef, LinkRef, MarkdownElement, RenderedLine};

/// A markdown document laid out for a fixed-size viewport.
///
/// # Example
///
/// ```
/// use richview::config::RichTextOptions;
/// use richview::document::Document;
///
/// let mut doc = Document::with_content("# Title\n\nHello world", RichTextOptions::default());
/// assert_eq!(doc.elements().len(), 2);
/// assert_eq!(doc.search("world"), 1);
/// assert_eq!(doc.scroll_position(), 0);
/// ```
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    source: String,
    elements: Vec<MarkdownElement>,
    options: RichTextOptions,
    layout: Layout,
    gutter_width: usize,
    viewport: Viewport,
    search: SearchState,
    highlighter: HighlightCache,
    detected: Vec<LanguageDetection>,
    observers: Observers,
    last_render: Duration,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(RichTextOptions::default())
    }
}

impl Document {
    /// An empty document.
    pub fn new(options: RichTextOptions) -> Self {
        Self::with_content(String::new(), options)
    }

    /// Parse `source` and lay it out with `options`.
    pub fn with_content(source: impl Into<String>, options: RichTextOptions) -> Self {
        let source = source.into();
        let elements = parse(&source);
        let viewport = Viewport::new(options.width, options.height, 0)
            .with_page_percent(options.page_percent);
        let highlighter =
            HighlightCache::new(options.syntax_highlighting, options.auto_detect_language);
        let mut doc = Self {
            id: DocumentId::next(),
            source,
            elements,
            options,
            layout: Layout::default(),
            gutter_width: 0,
            viewport,
            search: SearchState::new(),
            highlighter,
            detected: Vec::new(),
            observers: Observers::default(),
            last_render: Duration::ZERO,
        };
        doc.relayout();
        doc
    }

    /// Identifier carried by every notification this document emits.
    pub const fn id(&self) -> DocumentId {
        self.id
    }

    /// Replace the markdown source.
    ///
    /// The scroll offset is kept where possible and clamped to the new length.
    /// An active search is re-run against the new lines.
    pub fn set_content(&mut self, source: impl Into<String>) {
        let _scope = crate::perf::scope("document.set_content");
        self.source = source.into();
        self.elements = parse(&self.source);
        self.highlighter.clear();
        self.detected.clear();
        self.relayout();
        let event = RichTextEvent::ContentChanged {
            elements: self.elements.len(),
            lines: self.layout.lines.len(),
        };
        self.emit(event);
    }

    /// The markdown source as last set.
    pub fn content(&self) -> &str {
        &self.source
    }

    /// Parsed block elements, in document order.
    pub fn elements(&self) -> &[MarkdownElement] {
        &self.elements
    }

    // Scrolling

    /// Scroll down `lines` rows. Returns true if the offset moved.
    pub fn scroll_down(&mut self, lines: usize) -> bool {
        let changed = self.viewport.scroll_down(lines);
        self.after_scroll(changed)
    }

    /// Scroll up `lines` rows. Returns true if the offset moved.
    pub fn scroll_up(&mut self, lines: usize) -> bool {
        let changed = self.viewport.scroll_up(lines);
        self.after_scroll(changed)
    }

    /// Scroll by a signed number of lines.
    pub fn scroll_by(&mut self, delta: i64) -> bool {
        let changed = self.viewport.scroll_by(delta);
        self.after_scroll(changed)
    }

    /// Scroll down one page (`page_percent` of the height).
    pub fn page_down(&mut self) -> bool {
        let changed = self.viewport.page_down();
        self.after_scroll(changed)
    }

    /// Scroll up one page (`page_percent` of the height).
    pub fn page_up(&mut self) -> bool {
        let changed = self.viewport.page_up();
        self.after_scroll(changed)
    }

    /// Scroll down half the viewport height.
    pub fn half_page_down(&mut self) -> bool {
        let changed = self.viewport.half_page_down();
        self.after_scroll(changed)
    }

    /// Scroll up half the viewport height.
    pub fn half_page_up(&mut self) -> bool {
        let changed = self.viewport.half_page_up();
        self.after_scroll(changed)
    }

    /// Jump to the first line.
    pub fn scroll_to_top(&mut self) -> bool {
        let changed = self.viewport.go_to_top();
        self.after_scroll(changed)
    }

    /// Jump so the last line sits at the bottom of the viewport.
    pub fn scroll_to_bottom(&mut self) -> bool {
        let changed = self.viewport.go_to_bottom();
        self.after_scroll(changed)
    }

    /// Put `line` at the top of the viewport, clamped to the scroll range.
    pub fn scroll_to_line(&mut self, line: usize) -> bool {
        let changed = self.viewport.go_to_line(line);
        self.after_scroll(changed)
    }

    /// Jump to `percent` of the scroll range.
    pub fn scroll_to_percent(&mut self, percent: u8) -> bool {
        let changed = self.viewport.go_to_percent(percent);
        self.after_scroll(changed)
    }

    /// Horizontal scrolling only has room to move when wrapping is off.
    pub fn scroll_left(&mut self, columns: usize) -> bool {
        self.viewport.scroll_left(columns)
    }

    /// Scroll right by `columns`, up to the widest line.
    pub fn scroll_right(&mut self, columns: usize) -> bool {
        self.viewport.scroll_right(columns)
    }

    /// Current vertical offset in rendered lines.
    pub const fn scroll_position(&self) -> usize {
        self.viewport.offset()
    }

    /// Largest valid vertical offset.
    pub const fn max_scroll(&self) -> usize {
        self.viewport.max_offset()
    }

    /// Columns scrolled to the right.
    pub const fn horizontal_offset(&self) -> usize {
        self.viewport.horizontal_offset()
    }

    /// The scroll state over the rendered lines.
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    // Search

    /// Search the rendered text. Returns the number of matches.
    ///
    /// An empty query clears the search and returns 0.
    pub fn search(&mut self, query: &str) -> usize {
        let count = self
            .search
            .search(&self.layout.lines, query, self.options.case_sensitive_search);
        self.emit_search();
        self.reveal_current_match();
        count
    }

    /// Move to the next match, wrapping around after the last.
    pub fn next_search_result(&mut self) -> Option<SearchMatch> {
        let found = self.search.next().copied();
        if found.is_some() {
            self.emit_search();
            self.reveal_current_match();
        }
        found
    }

    /// Move to the previous match, wrapping around before the first.
    pub fn previous_search_result(&mut self) -> Option<SearchMatch> {
        let found = self.search.previous().copied();
        if found.is_some() {
            self.emit_search();
            self.reveal_current_match();
        }
        found
    }

    /// Drop the query and its results.
    pub fn clear_search(&mut self) {
        if self.search.query().is_none() {
            return;
        }
        self.search.clear();
        self.emit_search();
    }

    /// Matches of the active query, in line and column order.
    pub fn search_results(&self) -> &[SearchMatch] {
        self.search.matches()
    }

    /// Index of the current match, `None` without results.
    pub const fn current_search_index(&self) -> Option<usize> {
        self.search.current_index()
    }

    /// The current match, if any.
    pub fn current_search_result(&self) -> Option<&SearchMatch> {
        self.search.current()
    }

    /// The active query, if any.
    pub fn search_query(&self) -> Option<&str> {
        self.search.query()
    }

    /// Query, results and cursor together.
    pub const fn search_state(&self) -> &SearchState {
        &self.search
    }

    // Options

    /// Options the document is laid out with.
    pub const fn options(&self) -> &RichTextOptions {
        &self.options
    }

    /// Replace the options.
    ///
    /// Layout is redone only when an option that shapes the lines changed.
    /// A change of search case sensitivity re-runs the active query.
    pub fn set_options(&mut self, options: RichTextOptions) {
        if options == self.options {
            return;
        }
        let previous = std::mem::replace(&mut self.options, options);
        let needs_layout = previous.layout_options(0) != self.options.layout_options(0)
            || previous.line_numbers != self.options.line_numbers
            || previous.syntax_highlighting != self.options.syntax_highlighting
            || previous.auto_detect_language != self.options.auto_detect_language;

        self.viewport = self
            .viewport
            .clone()
            .with_page_percent(self.options.page_percent);
        tracing::debug!(document = %self.id, needs_layout, "options changed");

        let rerun_query = (previous.case_sensitive_search != self.options.case_sensitive_search)
            .then(|| self.search.query().map(str::to_string))
            .flatten();

        if needs_layout {
            // A query about to be re-run must not report results for the old case policy.
            self.layout_pass(rerun_query.is_none());
        } else {
            let changed = self.resize_viewport();
            self.after_scroll(changed);
        }

        if let Some(query) = rerun_query {
            self.search(&query);
        }
    }

    /// Resize to `width` x `height` cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        let options = self.options.clone().with_size(width, height);
        self.set_options(options);
    }

    // Rendering

    /// The laid-out lines. Never re-lays out and never notifies.
    pub fn render(&self) -> &[RenderedLine] {
        &self.layout.lines
    }

    /// Lines inside the viewport.
    pub fn visible_lines(&self) -> &[RenderedLine] {
        let range = self.viewport.visible_range();
        let end = range.end.min(self.layout.lines.len());
        let start = range.start.min(end);
        &self.layout.lines[start..end]
    }

    /// Number of rendered lines.
    pub fn line_count(&self) -> usize {
        self.layout.lines.len()
    }

    /// Cells reserved left of the text for line numbers, 0 when they are off.
    pub const fn gutter_width(&self) -> usize {
        self.gutter_width
    }

    /// Width available to the text column.
    pub fn text_width(&self) -> usize {
        usize::from(self.options.width)
            .saturating_sub(self.gutter_width)
            .max(1)
    }

    /// The rendered text without styling, one line per row.
    pub fn plain_text(&self) -> String {
        self.layout
            .lines
            .iter()
            .map(RenderedLine::content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Duration of the most recent layout.
    pub const fn last_render_time(&self) -> Duration {
        self.last_render
    }

    // Structure

    /// Headings with the rendered line each starts on.
    pub fn headings(&self) -> &[HeadingRef] {
        &self.layout.headings
    }

    /// Put heading `index` at the top of the viewport.
    pub fn scroll_to_heading(&mut self, index: usize) -> bool {
        match self.layout.headings.get(index) {
            Some(heading) => {
                let line = heading.line;
                self.scroll_to_line(line)
            }
            None => false,
        }
    }

    /// Rendered line of the heading an internal `#anchor` points at.
    pub fn resolve_anchor(&self, anchor: &str) -> Option<usize> {
        let target = anchor.trim().trim_start_matches('#');
        if target.is_empty() {
            return None;
        }
        let wanted = normalize_anchor(target);
        self.layout
            .headings
            .iter()
            .find(|heading| normalize_anchor(&heading.text) == wanted)
            .map(|heading| heading.line)
    }

    /// Links in document order. Empty when hyperlinks are off.
    pub fn links(&self) -> &[LinkRef] {
        &self.layout.links
    }

    /// Index of the link under a rendered line and text column.
    pub fn link_at(&self, line: usize, column: usize) -> Option<usize> {
        self.layout
            .links
            .iter()
            .position(|link| link.contains(line, column))
    }

    /// Follow a link by index.
    ///
    /// Internal `#anchor` links scroll to their heading. Every activation is
    /// reported with a `LinkActivated` notification.
    pub fn activate_link(&mut self, index: usize) -> bool {
        if !self.options.hyperlinks {
            return false;
        }
        let Some(link) = self.layout.links.get(index) else {
            return false;
        };
        let text = link.text.clone();
        let url = link.url.clone();
        tracing::debug!(document = %self.id, url = url.as_str(), "link activated");
        if url.starts_with('#')
            && let Some(line) = self.resolve_anchor(&url)
        {
            self.scroll_to_line(line);
        }
        self.emit(RichTextEvent::LinkActivated { text, url });
        true
    }

    /// Images in document order.
    pub fn images(&self) -> &[ImageRef] {
        &self.layout.images
    }

    /// First rendered line of a top-level element.
    pub fn element_line(&self, index: usize) -> Option<usize> {
        self.layout.element_lines.get(index).copied()
    }

    /// Languages guessed for untagged code blocks of the current content.
    pub fn detected_languages(&self) -> &[LanguageDetection] {
        &self.detected
    }

    // Observers

    /// Call `callback` for every notification. Returns a handle for `unsubscribe`.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Notification) + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Receive notifications over a channel; dropping the receiver unsubscribes.
    pub fn subscribe_channel(&mut self) -> mpsc::Receiver<Notification> {
        self.observers.subscribe_channel()
    }

    /// Stop notifying a subscriber. Returns false for an unknown handle.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn relayout(&mut self) {
        self.layout_pass(true);
    }

    fn layout_pass(&mut self, refresh_search: bool) {
        let scope = crate::perf::scope("document.relayout");
        self.highlighter.configure(
            self.options.syntax_highlighting,
            self.options.auto_detect_language,
        );

        // The gutter holds the widest line number plus a space. Narrowing the
        // text column can add lines, so widen until the digit count is stable.
        let mut digits = 1;
        let (layout, gutter) = loop {
            let gutter = if self.options.line_numbers { digits + 1 } else { 0 };
            let layout_options = self.options.layout_options(gutter);
            self.highlighter.begin_pass();
            let layout = layout::layout(&self.elements, &layout_options, &mut self.highlighter);
            let needed = digit_count(layout.lines.len());
            if !self.options.line_numbers || needed <= digits {
                break (layout, gutter);
            }
            digits = needed;
        };
        self.layout = layout;
        self.gutter_width = gutter;

        let content_width = self
            .layout
            .lines
            .iter()
            .map(RenderedLine::width)
            .max()
            .unwrap_or(0);
        let resized = self.resize_viewport();
        let clamped = self.viewport.set_total_lines(self.layout.lines.len());
        self.viewport.set_content_width(content_width);

        self.last_render = scope.elapsed();
        let line_count = self.layout.lines.len();
        tracing::debug!(
            document = %self.id,
            lines = line_count,
            gutter,
            elapsed_us = self.last_render.as_micros(),
            "relayout"
        );

        for detection in self.highlighter.take_detections() {
            self.detected.push(detection.clone());
            self.emit(RichTextEvent::LanguageDetected {
                block: detection.block,
                language: detection.language,
            });
        }
        self.emit(RichTextEvent::RenderCompleted {
            elapsed: self.last_render,
            line_count,
        });
        if refresh_search && self.search.refresh(&self.layout.lines) {
            self.emit_search();
        }
        self.after_scroll(resized || clamped);
    }

    fn resize_viewport(&mut self) -> bool {
        let width = u16::try_from(self.text_width()).unwrap_or(u16::MAX);
        self.viewport.resize(width, self.options.height)
    }

    fn reveal_current_match(&mut self) {
        if !self.options.scroll_to_search_result {
            return;
        }
        let Some(line) = self.search.current().map(|m| m.line) else {
            return;
        };
        let changed = self.viewport.ensure_visible(line);
        self.after_scroll(changed);
    }

    fn after_scroll(&mut self, changed: bool) -> bool {
        if changed {
            let event = RichTextEvent::ScrollChanged {
                offset: self.viewport.offset(),
                max: self.viewport.max_offset(),
            };
            self.emit(event);
        }
        changed
    }

    fn emit_search(&mut self) {
        let event = RichTextEvent::SearchResultsChanged {
            query: self.search.query().map(str::to_string),
            count: self.search.len(),
            current: self.search.current_index(),
        };
        self.emit(event);
    }

    fn emit(&mut self, event: RichTextEvent) {
        self.observers.emit(self.id, event);
    }
}

fn digit_count(n: usize) -> usize {
    n.max(1).to_string().len()
}

/// Slug used to match `#anchor` links against heading text.
///
/// Keeps lowercase ASCII alphanumerics and collapses every other run of
/// characters into a single `-`.
pub fn normalize_anchor(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
