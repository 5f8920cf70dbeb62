//! Viewport management for scrolling.
//!
//! The [`Viewport`] struct tracks the visible area of the document
//! and handles all scroll operations. Every operation clamps silently and
//! reports whether the offset actually moved.

use std::ops::Range;

/// Default page step as a percentage of the viewport height.
pub const DEFAULT_PAGE_PERCENT: u8 = 80;

/// Manages the visible portion of a document.
///
/// The viewport tracks:
/// - Terminal dimensions (width, height)
/// - Current scroll offset (in lines), always within `0..=max_offset()`
/// - Horizontal offset for unwrapped content
/// - Total document length
///
/// # Example
///
/// ```
/// use richview::ui::viewport::Viewport;
///
/// let mut vp = Viewport::new(80, 24, 100);
/// assert_eq!(vp.visible_range(), 0..24);
///
/// assert!(vp.scroll_down(10));
/// assert_eq!(vp.visible_range(), 10..34);
///
/// assert!(!vp.scroll_up(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    total_lines: usize,
    page_percent: u8,
    horizontal_offset: usize,
    content_width: usize,
}

impl Viewport {
    /// Create a new viewport.
    ///
    /// # Arguments
    ///
    /// * `width` - Terminal width in columns
    /// * `height` - Terminal height in lines (for document area)
    /// * `total_lines` - Total lines in the document
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            total_lines,
            page_percent: DEFAULT_PAGE_PERCENT,
            horizontal_offset: 0,
            content_width: 0,
        }
    }

    /// Set the page step percentage (clamped to 1..=100).
    #[must_use]
    pub fn with_page_percent(mut self, percent: u8) -> Self {
        self.page_percent = percent.clamp(1, 100);
        self
    }

    /// Get the current scroll offset.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Get the viewport width.
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the viewport height.
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Get the total number of lines in the document.
    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub const fn page_percent(&self) -> u8 {
        self.page_percent
    }

    /// Calculate the maximum valid offset.
    pub const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }

    /// Columns scrolled to the right when lines are not wrapped.
    pub const fn horizontal_offset(&self) -> usize {
        self.horizontal_offset
    }

    pub const fn max_horizontal_offset(&self) -> usize {
        self.content_width.saturating_sub(self.width as usize)
    }

    /// Lines moved by a page step; never less than one.
    pub fn page_size(&self) -> usize {
        (usize::from(self.height) * usize::from(self.page_percent) / 100).max(1)
    }

    /// Get the range of visible lines.
    ///
    /// Returns a range from the current offset to offset + height,
    /// clamped to the document bounds.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.offset.min(self.total_lines);
        let end = (self.offset + self.height as usize).min(self.total_lines);
        start..end
    }

    /// Get the scroll percentage (0-100).
    pub fn scroll_percent(&self) -> u8 {
        if self.total_lines == 0 {
            return 100;
        }

        let max_offset = self.max_offset();
        if max_offset == 0 {
            return 100;
        }

        // Percentage value always 0-100
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        {
            ((self.offset as f64 / max_offset as f64) * 100.0).round() as u8
        }
    }

    /// Check if we can scroll up.
    pub const fn can_scroll_up(&self) -> bool {
        self.offset > 0
    }

    /// Check if we can scroll down.
    pub const fn can_scroll_down(&self) -> bool {
        self.offset < self.max_offset()
    }

    /// Scroll by a signed number of lines; positive moves down.
    pub fn scroll_by(&mut self, delta: i64) -> bool {
        let amount = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
        if delta < 0 {
            self.scroll_up(amount)
        } else {
            self.scroll_down(amount)
        }
    }

    /// Scroll up by n lines.
    pub fn scroll_up(&mut self, n: usize) -> bool {
        self.set_offset(self.offset.saturating_sub(n))
    }

    /// Scroll down by n lines.
    pub fn scroll_down(&mut self, n: usize) -> bool {
        self.set_offset(self.offset.saturating_add(n))
    }

    /// Scroll up one page.
    pub fn page_up(&mut self) -> bool {
        self.scroll_up(self.page_size())
    }

    /// Scroll down one page.
    pub fn page_down(&mut self) -> bool {
        self.scroll_down(self.page_size())
    }

    /// Scroll up half a page.
    pub fn half_page_up(&mut self) -> bool {
        self.scroll_up((self.height as usize / 2).max(1))
    }

    /// Scroll down half a page.
    pub fn half_page_down(&mut self) -> bool {
        self.scroll_down((self.height as usize / 2).max(1))
    }

    /// Go to the beginning of the document.
    pub fn go_to_top(&mut self) -> bool {
        self.set_offset(0)
    }

    /// Go to the end of the document.
    pub fn go_to_bottom(&mut self) -> bool {
        self.set_offset(self.max_offset())
    }

    /// Go to a specific line.
    ///
    /// The line will be positioned at the top of the viewport.
    pub fn go_to_line(&mut self, line: usize) -> bool {
        self.set_offset(line)
    }

    /// Go to a percentage through the document.
    pub fn go_to_percent(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        // Acceptable for scrollbar/progress calculation
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let target = (self.max_offset() as f64 * f64::from(percent) / 100.0).round() as usize;
        self.set_offset(target)
    }

    /// Scroll the minimum amount needed to bring `line` on screen.
    pub fn ensure_visible(&mut self, line: usize) -> bool {
        let height = self.height as usize;
        if line < self.offset {
            self.set_offset(line)
        } else if height > 0 && line >= self.offset + height {
            self.set_offset(line + 1 - height)
        } else {
            false
        }
    }

    pub fn scroll_left(&mut self, n: usize) -> bool {
        self.set_horizontal_offset(self.horizontal_offset.saturating_sub(n))
    }

    pub fn scroll_right(&mut self, n: usize) -> bool {
        self.set_horizontal_offset(self.horizontal_offset.saturating_add(n))
    }

    /// Record the widest line so horizontal scrolling can be bounded.
    pub fn set_content_width(&mut self, width: usize) {
        self.content_width = width;
        self.horizontal_offset = self.horizontal_offset.min(self.max_horizontal_offset());
    }

    /// Resize the viewport. Returns true if the offset had to move.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        self.width = width;
        self.height = height;
        self.horizontal_offset = self.horizontal_offset.min(self.max_horizontal_offset());
        // Clamp offset if document is now shorter than viewport
        self.set_offset(self.offset)
    }

    /// Update the total number of lines (e.g., after reload).
    pub fn set_total_lines(&mut self, total: usize) -> bool {
        self.total_lines = total;
        self.set_offset(self.offset)
    }

    fn set_offset(&mut self, target: usize) -> bool {
        let clamped = target.min(self.max_offset());
        let changed = clamped != self.offset;
        self.offset = clamped;
        changed
    }

    fn set_horizontal_offset(&mut self, target: usize) -> bool {
        let clamped = target.min(self.max_horizontal_offset());
        let changed = clamped != self.horizontal_offset;
        self.horizontal_offset = clamped;
        changed
    }
}
