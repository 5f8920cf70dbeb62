// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. search::SearchMatch)
    clippy::module_name_repetitions
)]

//! # Richview
//!
//! A rich-text markdown rendering core for terminal UIs, with a small viewer
//! built on top of it.
//!
//! A [`document::Document`] takes markdown source and:
//! - Parses it into block elements
//! - Highlights code blocks, guessing the language of untagged ones
//! - Lays the result out into styled lines at a fixed width
//! - Scrolls a viewport over those lines
//! - Searches the rendered text
//! - Notifies observers of what changed
//!
//! ```
//! use richview::config::RichTextOptions;
//! use richview::document::Document;
//!
//! let options = RichTextOptions::default().with_size(40, 10);
//! let mut doc = Document::with_content("# Notes\n\nSome *rich* text.", options);
//! assert_eq!(doc.headings()[0].text, "Notes");
//! assert_eq!(doc.search("rich"), 1);
//! ```
//!
//! ## Modules
//!
//! - [`document`]: Markdown parsing and the `Document` façade
//! - [`layout`]: Wrapping, tables, lists and code blocks into lines
//! - [`highlight`]: Syntax highlighting and language detection
//! - [`search`]: Search over rendered lines
//! - [`events`]: Notifications and observers
//! - [`config`]: Render options and saved CLI defaults
//! - [`ui`]: Ratatui widget, viewport and styles
//! - [`app`]: The interactive viewer (The Elm Architecture)
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod document;
pub mod events;
pub mod highlight;
pub mod layout;
pub mod perf;
pub mod search;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::RichTextOptions;
    pub use crate::document::{Document, MarkdownElement, RenderedLine};
    pub use crate::events::{Notification, RichTextEvent};
    pub use crate::search::SearchMatch;
    pub use crate::ui::RichTextView;
    pub use crate::ui::viewport::Viewport;
}
