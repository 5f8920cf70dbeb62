//! Rendering options and persisted CLI defaults.
//!
//! [`RichTextOptions`] is the immutable option set a document renders with;
//! changing anything means building a new value and handing it to
//! [`crate::document::Document::set_options`]. [`ConfigFlags`] are the CLI
//! defaults saved to a config file with `--save`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::layout::LayoutOptions;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

/// Options a document renders with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichTextOptions {
    /// Viewport width in cells, including the line-number gutter
    pub width: u16,
    /// Viewport height in lines
    pub height: u16,
    pub tab_size: usize,
    pub word_wrap: bool,
    pub line_numbers: bool,
    pub syntax_highlighting: bool,
    /// Guess the language of untagged code blocks
    pub auto_detect_language: bool,
    pub hyperlinks: bool,
    pub case_sensitive_search: bool,
    /// Move the viewport to the current search match when it is off-screen
    pub scroll_to_search_result: bool,
    /// Page step as a percentage of the height
    pub page_percent: u8,
    pub bullet: char,
    pub quote_prefix: String,
    pub table_border: char,
}

impl Default for RichTextOptions {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            tab_size: 4,
            word_wrap: true,
            line_numbers: false,
            syntax_highlighting: true,
            auto_detect_language: true,
            hyperlinks: true,
            case_sensitive_search: false,
            scroll_to_search_result: true,
            page_percent: crate::ui::viewport::DEFAULT_PAGE_PERCENT,
            bullet: '•',
            quote_prefix: "│ ".to_string(),
            table_border: '│',
        }
    }
}

impl RichTextOptions {
    #[must_use]
    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size;
        self
    }

    #[must_use]
    pub fn with_word_wrap(mut self, enabled: bool) -> Self {
        self.word_wrap = enabled;
        self
    }

    #[must_use]
    pub fn with_line_numbers(mut self, enabled: bool) -> Self {
        self.line_numbers = enabled;
        self
    }

    #[must_use]
    pub fn with_syntax_highlighting(mut self, enabled: bool) -> Self {
        self.syntax_highlighting = enabled;
        self
    }

    #[must_use]
    pub fn with_auto_detect_language(mut self, enabled: bool) -> Self {
        self.auto_detect_language = enabled;
        self
    }

    #[must_use]
    pub fn with_hyperlinks(mut self, enabled: bool) -> Self {
        self.hyperlinks = enabled;
        self
    }

    #[must_use]
    pub fn with_case_sensitive_search(mut self, enabled: bool) -> Self {
        self.case_sensitive_search = enabled;
        self
    }

    #[must_use]
    pub fn with_scroll_to_search_result(mut self, enabled: bool) -> Self {
        self.scroll_to_search_result = enabled;
        self
    }

    #[must_use]
    pub fn with_page_percent(mut self, percent: u8) -> Self {
        self.page_percent = percent;
        self
    }

    #[must_use]
    pub fn with_bullet(mut self, bullet: char) -> Self {
        self.bullet = bullet;
        self
    }

    #[must_use]
    pub fn with_quote_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.quote_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_table_border(mut self, border: char) -> Self {
        self.table_border = border;
        self
    }

    /// Layout inputs for a text column `gutter` cells narrower than the viewport.
    pub fn layout_options(&self, gutter: usize) -> LayoutOptions {
        LayoutOptions {
            width: usize::from(self.width).saturating_sub(gutter).max(1),
            tab_size: self.tab_size,
            word_wrap: self.word_wrap,
            bullet: self.bullet,
            quote_prefix: self.quote_prefix.clone(),
            table_border: self.table_border,
            hyperlinks: self.hyperlinks,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub no_wrap: bool,
    pub line_numbers: bool,
    pub no_highlight: bool,
    pub no_links: bool,
    pub case_sensitive: bool,
    pub perf: bool,
    pub tab_size: Option<usize>,
    pub width: Option<u16>,
    pub theme: Option<ThemeMode>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            no_wrap: self.no_wrap || other.no_wrap,
            line_numbers: self.line_numbers || other.line_numbers,
            no_highlight: self.no_highlight || other.no_highlight,
            no_links: self.no_links || other.no_links,
            case_sensitive: self.case_sensitive || other.case_sensitive,
            perf: self.perf || other.perf,
            tab_size: other.tab_size.or(self.tab_size),
            width: other.width.or(self.width),
            theme: other.theme.or(self.theme),
        }
    }

    /// Apply these flags on top of `options`.
    pub fn apply(&self, options: RichTextOptions) -> RichTextOptions {
        let word_wrap = options.word_wrap && !self.no_wrap;
        let line_numbers = options.line_numbers || self.line_numbers;
        let highlighting = options.syntax_highlighting && !self.no_highlight;
        let hyperlinks = options.hyperlinks && !self.no_links;
        let case_sensitive = options.case_sensitive_search || self.case_sensitive;
        let mut options = options
            .with_word_wrap(word_wrap)
            .with_line_numbers(line_numbers)
            .with_syntax_highlighting(highlighting)
            .with_hyperlinks(hyperlinks)
            .with_case_sensitive_search(case_sensitive);
        if let Some(tab_size) = self.tab_size {
            options = options.with_tab_size(tab_size);
        }
        if let Some(width) = self.width {
            let height = options.height;
            options = options.with_size(width, height);
        }
        options
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("richview").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("richview")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("richview").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("richview")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".richviewrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    tracing::debug!(path = %path.display(), tokens = tokens.len(), "loaded config");
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# richview defaults (saved with --save)".to_string()];
    let switches = [
        (flags.watch, "--watch"),
        (flags.no_wrap, "--no-wrap"),
        (flags.line_numbers, "--line-numbers"),
        (flags.no_highlight, "--no-highlight"),
        (flags.no_links, "--no-links"),
        (flags.case_sensitive, "--case-sensitive"),
        (flags.perf, "--perf"),
    ];
    lines.extend(
        switches
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| (*flag).to_string()),
    );
    if let Some(tab_size) = flags.tab_size {
        lines.push(format!("--tab-size {tab_size}"));
    }
    if let Some(width) = flags.width {
        lines.push(format!("--width {width}"));
    }
    if let Some(theme) = flags.theme {
        let theme_str = match theme {
            ThemeMode::Auto => "auto",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        lines.push(format!("--theme {theme_str}"));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the flags this module understands out of raw arguments.
///
/// Unknown tokens and unparsable values are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let mut value = || {
            inline_value.or_else(|| {
                let next = tokens.get(i + 1).map(String::as_str);
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--watch" | "-w" => flags.watch = true,
            "--no-wrap" => flags.no_wrap = true,
            "--line-numbers" | "-n" => flags.line_numbers = true,
            "--no-highlight" => flags.no_highlight = true,
            "--no-links" => flags.no_links = true,
            "--case-sensitive" => flags.case_sensitive = true,
            "--perf" => flags.perf = true,
            "--theme" => flags.theme = value().and_then(parse_theme),
            "--tab-size" => flags.tab_size = value().and_then(|v| parse_number(name, v)),
            "--width" => flags.width = value().and_then(|v| parse_number(name, v)),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Option<T> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        tracing::warn!(flag, value, "ignoring invalid number");
    }
    parsed
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => {
            tracing::warn!(theme = s, "ignoring unknown theme");
            None
        }
    }
}
