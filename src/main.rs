//! Richview - A terminal viewer for rich markdown text.
//!
//! # Usage
//!
//! ```bash
//! richview README.md
//! richview --watch --line-numbers README.md
//! richview --print --width 72 notes.md
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use richview::app::App;
use richview::config::{
    ConfigFlags, RichTextOptions, ThemeMode, clear_config_flags, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, save_config_flags,
};
use richview::document::{Document, prepare_content};
use richview::highlight::{HighlightBackground, set_background_mode};
use richview::perf;

const PRINT_WIDTH: u16 = 80;

/// A terminal viewer for rich markdown text
#[derive(Parser, Debug)]
#[command(name = "richview", version, about, long_about = None)]
struct Cli {
    /// Markdown (or source) file to view
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print the laid-out text to stdout instead of opening the viewer
    #[arg(short, long)]
    print: bool,

    /// Watch file for changes and auto-reload
    #[arg(short, long)]
    watch: bool,

    /// Truncate long lines instead of wrapping them
    #[arg(long)]
    no_wrap: bool,

    /// Show a line-number gutter
    #[arg(short = 'n', long)]
    line_numbers: bool,

    /// Disable syntax highlighting in code blocks
    #[arg(long)]
    no_highlight: bool,

    /// Render links as plain text
    #[arg(long)]
    no_links: bool,

    /// Match case when searching
    #[arg(long)]
    case_sensitive: bool,

    /// Columns per tab stop in code blocks
    #[arg(long, value_name = "N")]
    tab_size: Option<usize>,

    /// Maximum layout width in columns
    #[arg(long, value_name = "COLS")]
    width: Option<u16>,

    /// Force syntax highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Enable startup performance logging
    #[arg(long)]
    perf: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

// Query the terminal background using OSC 11 on /dev/tty, so the reply
// arrives even when stdout is redirected. Other platforms skip the query:
// an unanswered read would leave a reader thread holding console input.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let mut tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let mut reader = tty.try_clone()?;

    tty.write_all(b"\x1b]11;?\x07")?;
    tty.flush()?;

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = [0u8; 256];
        let mut collected = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if is_osc_terminated(&collected) {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let reply = rx
        .recv_timeout(Duration::from_millis(75))
        .unwrap_or_default();
    Ok(parse_osc11_reply(&String::from_utf8_lossy(&reply)))
}

fn is_osc_terminated(bytes: &[u8]) -> bool {
    bytes.contains(&b'\x07') || bytes.windows(2).any(|w| w == b"\x1b\\")
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn detect_theme() -> Option<HighlightBackground> {
    if !std::io::stdout().is_terminal() {
        return None;
    }
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    match result {
        Ok(rgb) => rgb.map(|(r, g, b)| theme_from_rgb(r, g, b)),
        Err(err) => {
            tracing::debug!(%err, "background query failed");
            None
        }
    }
}

/// Parse `ESC ] 11 ; rgb:RRRR/GGGG/BBBB` terminated by BEL or ST.
fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parse_osc_component(parts.next()?)?;
    let g = parse_osc_component(parts.next()?)?;
    let b = parse_osc_component(parts.next()?)?;
    Some((r, g, b))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    match hex.len() {
        2 => u8::from_str_radix(hex, 16).ok(),
        n if n >= 4 => {
            let value = u16::from_str_radix(hex.get(..4)?, 16).ok()?;
            u8::try_from(value >> 8).ok()
        }
        _ => None,
    }
}

fn apply_theme(mode: ThemeMode, detect: bool) {
    match mode {
        ThemeMode::Auto => set_background_mode(if detect { detect_theme() } else { None }),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }
}

/// Lay the file out once and write the plain text to stdout.
fn print_document(
    file: &std::path::Path,
    options: RichTextOptions,
    width: Option<u16>,
) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let width = width.unwrap_or_else(|| {
        crossterm::terminal::size()
            .map(|(cols, _)| cols)
            .unwrap_or(PRINT_WIDTH)
    });
    let options = options.with_size(width, u16::MAX);
    let document = Document::with_content(prepare_content(file, source), options);
    tracing::debug!(
        lines = document.line_count(),
        elapsed = ?document.last_render_time(),
        "laid out document"
    );
    println!("{}", document.plain_text());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
        tracing::info!(path = %global_path.display(), "saved defaults");
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    apply_theme(effective.theme.unwrap_or(ThemeMode::Auto), !cli.print);

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let options = effective.apply(RichTextOptions::default());

    if cli.print {
        return print_document(&cli.file, options, effective.width);
    }

    let mut app = App::new(cli.file)
        .with_options(options)
        .with_watch(effective.watch)
        .with_width_limit(effective.width)
        .with_config_paths(
            Some(global_path),
            local_path.exists().then_some(local_path),
        );

    app.run().context("Application error")
}
