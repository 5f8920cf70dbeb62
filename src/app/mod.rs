//! The interactive terminal viewer.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::config::RichTextOptions;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug, Clone)]
pub struct App {
    file_path: PathBuf,
    options: RichTextOptions,
    watch_enabled: bool,
    width_limit: Option<u16>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application for the given file.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            options: RichTextOptions::default(),
            watch_enabled: false,
            width_limit: None,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Render options; the size is replaced by the terminal's.
    #[must_use]
    pub fn with_options(mut self, options: RichTextOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable file watching.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Never lay out wider than `limit` columns.
    #[must_use]
    pub const fn with_width_limit(mut self, limit: Option<u16>) -> Self {
        self.width_limit = limit;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

#[cfg(test)]
mod tests;
