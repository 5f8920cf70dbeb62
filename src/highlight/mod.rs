//! Syntax highlighting for code blocks.
//!
//! Uses syntect's Sublime Text grammars to tokenize code, then folds the
//! scope stack of every token into a small set of [`TokenClass`]es that the
//! renderer colors from a light or dark palette.

mod detect;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use syntect::easy::ScopeRangeIterator;
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::document::{InlineColor, InlineSpan, InlineStyle, TokenClass};

pub use detect::detect_language;

/// Language tokens that resolve to a bundled grammar.
const LANGUAGE_TOKENS: &[&str] = &[
    "rust",
    "python",
    "javascript",
    "typescript",
    "go",
    "c",
    "cpp",
    "csharp",
    "java",
    "ruby",
    "php",
    "bash",
    "sql",
    "json",
    "html",
    "css",
    "yaml",
    "xml",
    "lua",
    "perl",
    "haskell",
    "scala",
    "markdown",
    "diff",
    "makefile",
];

/// Fence tags that syntect does not know under the same name.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("typescript", "js"),
    ("ts", "js"),
    ("tsx", "js"),
    ("jsx", "js"),
    ("shell", "sh"),
    ("zsh", "sh"),
    ("console", "sh"),
    ("c++", "cpp"),
    ("csharp", "cs"),
    ("c#", "cs"),
    ("golang", "go"),
    ("yml", "yaml"),
    ("py3", "py"),
];

/// Produces styled spans for the lines of a code block.
///
/// The layout engine calls this once per code block, in document order.
pub trait CodeStyler {
    fn style_code(&mut self, language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>>;
}

/// Styler used when syntax highlighting is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainStyler;

impl CodeStyler for PlainStyler {
    fn style_code(&mut self, _language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>> {
        plain_lines(code)
    }
}

/// A language guessed for an untagged code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDetection {
    /// Index of the code block in document order
    pub block: usize,
    pub language: String,
}

/// Memoizing styler that owns language detection for one document.
///
/// Highlighted output is keyed by background, language and code, so a
/// relayout at a new width does not re-run the grammars while a background
/// switch still recolours. Detections are queued the first time each block is
/// seen and drained by the owner with [`Self::take_detections`].
#[derive(Debug, Default)]
pub struct HighlightCache {
    enabled: bool,
    auto_detect: bool,
    entries: HashMap<(BackgroundMode, Option<String>, String), Vec<Vec<InlineSpan>>>,
    detected: HashMap<String, Option<String>>,
    reported: HashSet<usize>,
    block_index: usize,
    pending: Vec<LanguageDetection>,
}

impl HighlightCache {
    pub fn new(enabled: bool, auto_detect: bool) -> Self {
        Self {
            enabled,
            auto_detect,
            ..Self::default()
        }
    }

    /// Update the flags, dropping memoized output when they change.
    pub fn configure(&mut self, enabled: bool, auto_detect: bool) {
        if self.enabled == enabled && self.auto_detect == auto_detect {
            return;
        }
        self.enabled = enabled;
        self.auto_detect = auto_detect;
        self.entries.clear();
    }

    /// Forget everything learned about the previous content.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.detected.clear();
        self.reported.clear();
        self.pending.clear();
        self.block_index = 0;
    }

    /// Reset the block counter before a layout pass.
    pub const fn begin_pass(&mut self) {
        self.block_index = 0;
    }

    pub fn take_detections(&mut self) -> Vec<LanguageDetection> {
        std::mem::take(&mut self.pending)
    }

    fn detect_once(&mut self, block: usize, code: &str) -> Option<String> {
        let found = match self.detected.get(code) {
            Some(found) => found.clone(),
            None => {
                let found = detect_language(code);
                self.detected.insert(code.to_string(), found.clone());
                found
            }
        };
        if let Some(language) = &found
            && self.reported.insert(block)
        {
            tracing::debug!(block, language = language.as_str(), "detected code block language");
            self.pending.push(LanguageDetection {
                block,
                language: language.clone(),
            });
        }
        found
    }
}

impl CodeStyler for HighlightCache {
    fn style_code(&mut self, language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>> {
        let block = self.block_index;
        self.block_index += 1;
        if !self.enabled {
            return plain_lines(code);
        }

        let resolved = match language {
            Some(language) => Some(language.to_string()),
            None if self.auto_detect => self.detect_once(block, code),
            None => None,
        };
        let key = (background_mode(), resolved, code.to_string());
        if let Some(lines) = self.entries.get(&key) {
            return lines.clone();
        }
        let lines = highlight_code(key.1.as_deref(), code);
        self.entries.insert(key, lines.clone());
        lines
    }
}

/// Highlight `code` as `language`, one span list per source line.
///
/// Unknown or missing languages produce plain code spans.
pub fn highlight_code(language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>> {
    let Some(syntax) = language.and_then(find_syntax) else {
        return plain_lines(code);
    };

    let _scope = crate::perf::scope("highlight.code_block");
    let syntax_set = syntax_set();
    let mode = background_mode();
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut lines = Vec::new();

    for line in LinesWithEndings::from(code) {
        let ops = match state.parse_line(line, syntax_set) {
            Ok(ops) => ops,
            Err(err) => {
                tracing::trace!(%err, "grammar failed, line left plain");
                Vec::new()
            }
        };

        let mut spans: Vec<InlineSpan> = Vec::new();
        let mut last_class = None;
        for (range, op) in ScopeRangeIterator::new(&ops, line) {
            if let Err(err) = stack.apply(op) {
                tracing::trace!(?err, "scope stack out of sync");
            }
            let text = line[range].trim_end_matches(['\n', '\r']);
            if text.is_empty() {
                continue;
            }
            let class = classify(&stack);
            if last_class == Some(class) {
                if let Some(prev) = spans.pop() {
                    let merged = format!("{}{}", prev.text(), text);
                    spans.push(prev.with_text(merged));
                    continue;
                }
            }
            spans.push(InlineSpan::new(text.to_string(), token_style(class, mode)));
            last_class = Some(class);
        }
        lines.push(spans);
    }

    lines
}

/// Unstyled code lines.
pub fn plain_lines(code: &str) -> Vec<Vec<InlineSpan>> {
    code.lines()
        .map(|line| {
            if line.is_empty() {
                return Vec::new();
            }
            let mut style = InlineStyle::default();
            style.code = true;
            vec![InlineSpan::new(line.to_string(), style)]
        })
        .collect()
}

/// Returns true if `language` maps to a bundled grammar.
pub fn is_supported(language: &str) -> bool {
    find_syntax(language).is_some()
}

/// Language tokens accepted on fenced code blocks.
pub fn supported_languages() -> Vec<&'static str> {
    LANGUAGE_TOKENS
        .iter()
        .copied()
        .filter(|token| is_supported(token))
        .collect()
}

/// Fence language for a source file, based on its extension.
///
/// Markdown and plain text files return `None`.
pub fn language_for_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if matches!(ext.as_str(), "md" | "markdown" | "mdown" | "mkd" | "txt") {
        return None;
    }
    syntax_set().find_syntax_by_extension(&ext).map(|_| ext)
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let syntax_set = syntax_set();
    let lower = language.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    let alias = LANGUAGE_ALIASES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, target)| *target);
    alias
        .and_then(|token| syntax_set.find_syntax_by_token(token))
        .or_else(|| syntax_set.find_syntax_by_token(&lower))
        .or_else(|| syntax_set.find_syntax_by_name(language))
        .filter(|syntax| syntax.name != "Plain Text")
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn classify(stack: &ScopeStack) -> TokenClass {
    stack
        .as_slice()
        .iter()
        .rev()
        .find_map(|scope| class_for_scope(&scope.build_string()))
        .unwrap_or(TokenClass::Plain)
}

fn class_for_scope(name: &str) -> Option<TokenClass> {
    let starts = |prefix: &str| name.starts_with(prefix);
    if starts("comment") {
        Some(TokenClass::Comment)
    } else if starts("string") || starts("constant.character") {
        Some(TokenClass::String)
    } else if starts("constant.numeric") {
        Some(TokenClass::Number)
    } else if starts("keyword") || starts("storage") || starts("constant.language") {
        Some(TokenClass::Keyword)
    } else if starts("entity.name.function")
        || starts("support.function")
        || starts("variable.function")
    {
        Some(TokenClass::Function)
    } else if starts("variable") || starts("entity.name") || starts("support.type") {
        Some(TokenClass::Identifier)
    } else {
        None
    }
}

fn token_style(class: TokenClass, mode: BackgroundMode) -> InlineStyle {
    let mut style = InlineStyle::default();
    style.code = true;
    style.token = Some(class);
    style.fg = token_color(class, mode);
    style
}

const fn rgb(r: u8, g: u8, b: u8) -> Option<InlineColor> {
    Some(InlineColor { r, g, b })
}

const fn token_color(class: TokenClass, mode: BackgroundMode) -> Option<InlineColor> {
    match (mode, class) {
        (_, TokenClass::Plain) => None,
        (BackgroundMode::Dark, TokenClass::Keyword) => rgb(249, 38, 114),
        (BackgroundMode::Dark, TokenClass::String) => rgb(230, 219, 116),
        (BackgroundMode::Dark, TokenClass::Comment) => rgb(117, 113, 94),
        (BackgroundMode::Dark, TokenClass::Number) => rgb(174, 129, 255),
        (BackgroundMode::Dark, TokenClass::Function) => rgb(166, 226, 46),
        (BackgroundMode::Dark, TokenClass::Identifier) => rgb(102, 217, 239),
        (BackgroundMode::Light, TokenClass::Keyword) => rgb(167, 29, 93),
        (BackgroundMode::Light, TokenClass::String) => rgb(24, 54, 145),
        (BackgroundMode::Light, TokenClass::Comment) => rgb(120, 122, 120),
        (BackgroundMode::Light, TokenClass::Number) => rgb(0, 110, 150),
        (BackgroundMode::Light, TokenClass::Function) => rgb(121, 93, 163),
        (BackgroundMode::Light, TokenClass::Identifier) => rgb(0, 92, 140),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BackgroundMode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: OnceLock<Mutex<Option<HighlightBackground>>> = OnceLock::new();

pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(mut guard) = lock.lock() {
        *guard = mode;
    }
}

/// Returns true when code colors are tuned for a light terminal background.
pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode() -> BackgroundMode {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(guard) = lock.lock() {
        if let Some(mode) = *guard {
            return match mode {
                HighlightBackground::Light => BackgroundMode::Light,
                HighlightBackground::Dark => BackgroundMode::Dark,
            };
        }
    }
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return BackgroundMode::Dark;
    };

    if bg >= 7 {
        BackgroundMode::Light
    } else {
        BackgroundMode::Dark
    }
}
