use crate::app::{App, Message, Model, ToastLevel};
use crate::events::RichTextEvent;
use crate::watcher::{DEFAULT_DEBOUNCE, FileWatcher};

impl App {
    pub(super) fn make_file_watcher(model: &Model) -> anyhow::Result<FileWatcher> {
        FileWatcher::new(&model.file_path, DEFAULT_DEBOUNCE)
    }

    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        msg: &Message,
    ) {
        match msg {
            Message::ToggleWatch => {
                if model.watch_enabled {
                    match Self::make_file_watcher(model) {
                        Ok(watcher) => {
                            *file_watcher = Some(watcher);
                            model.show_toast(ToastLevel::Info, "Watching file changes");
                        }
                        Err(err) => {
                            tracing::warn!(path = %model.file_path.display(), "{err:#}");
                            model.watch_enabled = false;
                            *file_watcher = None;
                            model.show_toast(ToastLevel::Error, format!("Watch unavailable: {err}"));
                        }
                    }
                } else {
                    *file_watcher = None;
                    model.show_toast(ToastLevel::Info, "Watch disabled");
                }
            }
            Message::ForceReload | Message::FileChanged => {
                if let Err(err) = model.reload_from_disk() {
                    tracing::warn!(path = %model.file_path.display(), "reload failed: {err:#}");
                    model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
                } else if matches!(msg, Message::ForceReload) {
                    model.show_toast(ToastLevel::Info, "Reloaded");
                }
            }
            _ => {}
        }
        Self::handle_notifications(model);
    }

    /// React to what the document reported while handling a message.
    pub(super) fn handle_notifications(model: &mut Model) {
        for event in model.drain_notifications() {
            match event {
                RichTextEvent::LinkActivated { url, .. } => follow_link(model, &url),
                RichTextEvent::LanguageDetected { block, language } => {
                    tracing::debug!(block, language = language.as_str(), "code block language");
                }
                RichTextEvent::ContentChanged { lines, .. } => {
                    // Links may have moved or vanished
                    model.hovered_link = None;
                    tracing::debug!(lines, "content reloaded");
                }
                RichTextEvent::RenderCompleted {
                    elapsed,
                    line_count,
                } => {
                    crate::perf::log_event(
                        "render",
                        format!("lines={line_count} elapsed_us={}", elapsed.as_micros()),
                    );
                }
                RichTextEvent::ScrollChanged { .. }
                | RichTextEvent::SearchResultsChanged { .. } => {}
            }
        }
    }
}

fn follow_link(model: &mut Model, url: &str) {
    if let Some(anchor) = url.strip_prefix('#') {
        // The document already scrolled if the anchor resolved
        if model.document.resolve_anchor(anchor).is_some() {
            model.show_toast(ToastLevel::Info, format!("Jumped to #{anchor}"));
        } else {
            model.show_toast(ToastLevel::Error, format!("Anchor #{anchor} not found"));
        }
        return;
    }
    match open_external_link(url) {
        Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {url}")),
        Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err}")),
    }
}

fn open_external_link(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = std::process::Command::new("xdg-open");

    command
        .arg(url)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;
    Ok(())
}
