use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::config::RichTextOptions;
use crate::document::{Document, prepare_content};
use crate::events::{Notification, RichTextEvent};

const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// The document owns scrolling and search; the model adds what only the
/// viewer needs.
#[derive(Debug)]
pub struct Model {
    /// The loaded markdown document
    pub document: Document,
    /// Path to the source file
    pub file_path: PathBuf,
    /// Whether file watching is enabled
    pub watch_enabled: bool,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Query being typed; `Some` while the search prompt is open
    pub search_input: Option<String>,
    /// Link under the mouse pointer
    pub hovered_link: Option<usize>,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Upper bound on the document width, whatever the terminal size
    width_limit: Option<u16>,
    terminal_size: (u16, u16),
    notifications: Receiver<Notification>,
    toast: Option<Toast>,
}

impl Model {
    /// Create a model for `source`, sized to a terminal of `size` cells.
    pub fn new(
        file_path: PathBuf,
        source: impl Into<String>,
        options: RichTextOptions,
        size: (u16, u16),
    ) -> Self {
        let options = options.with_size(size.0, document_height(size.1));
        let mut document = Document::with_content(source, options);
        let notifications = document.subscribe_channel();
        Self {
            document,
            file_path,
            watch_enabled: false,
            help_visible: false,
            search_input: None,
            hovered_link: None,
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
            width_limit: None,
            terminal_size: size,
            notifications,
            toast: None,
        }
    }

    /// Load `path` from disk, wrapping source files in a code fence.
    ///
    /// # Errors
    /// Fails if the file cannot be read as UTF-8.
    pub fn open(path: &Path, options: RichTextOptions, size: (u16, u16)) -> Result<Self> {
        let source = read_source(path)?;
        Ok(Self::new(path.to_path_buf(), source, options, size))
    }

    /// Resize to a terminal of `width` x `height` cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.terminal_size = (width, height);
        let width = self.width_limit.map_or(width, |limit| width.min(limit.max(1)));
        self.document.resize(width, document_height(height));
    }

    /// Cap the document width below the terminal width.
    pub fn set_width_limit(&mut self, limit: Option<u16>) {
        self.width_limit = limit;
        let (width, height) = self.terminal_size;
        self.resize(width, height);
    }

    /// Re-read the file, keeping scroll position and the active search.
    ///
    /// # Errors
    /// Fails if the file cannot be read.
    pub fn reload_from_disk(&mut self) -> Result<()> {
        let source = read_source(&self.file_path)?;
        if source != self.document.content() {
            self.document.set_content(source);
        }
        Ok(())
    }

    /// Notifications the document emitted since the last call.
    pub fn drain_notifications(&mut self) -> Vec<RichTextEvent> {
        self.notifications
            .try_iter()
            .map(|notification| notification.event)
            .collect()
    }

    pub fn file_name(&self) -> String {
        self.file_path.file_name().map_or_else(
            || "untitled".to_string(),
            |name| name.to_string_lossy().to_string(),
        )
    }

    pub fn hovered_link_url(&self) -> Option<&str> {
        self.hovered_link
            .and_then(|idx| self.document.links().get(idx))
            .map(|link| link.url.as_str())
    }

    /// Link to follow with `o`: the hovered one, else the first visible one.
    pub fn preferred_link(&self) -> Option<usize> {
        if let Some(idx) = self.hovered_link.filter(|&i| i < self.document.links().len()) {
            return Some(idx);
        }
        let visible = self.document.viewport().visible_range();
        self.document
            .links()
            .iter()
            .position(|link| link.regions.iter().any(|r| visible.contains(&r.line)))
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .filter(|toast| Instant::now() < toast.expires_at)
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Drop an expired toast. Returns true if one was removed.
    pub fn expire_toast(&mut self) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| Instant::now() >= toast.expires_at)
        {
            self.toast = None;
            return true;
        }
        false
    }
}

fn document_height(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(crate::ui::FOOTER_ROWS).max(1)
}

fn read_source(path: &Path) -> Result<String> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(prepare_content(path, source))
}
