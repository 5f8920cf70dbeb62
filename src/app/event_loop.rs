use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::watcher::FileWatcher;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const RESIZE_DEBOUNCE_MS: u64 = 50;

/// Holds the latest terminal size until resizing pauses.
pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the terminal cannot be
    /// initialized, or drawing fails.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("failed to initialize terminal; richview needs an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let result = self.run_in_terminal(&mut terminal, (size.width, size.height));

        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();
        result
    }

    fn run_in_terminal(&self, terminal: &mut DefaultTerminal, size: (u16, u16)) -> Result<()> {
        let load_scope = crate::perf::scope("app.load");
        let mut model = Model::open(&self.file_path, self.options.clone(), size)?;
        drop(load_scope);
        model.set_width_limit(self.width_limit);
        model.watch_enabled = self.watch_enabled;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        Self::handle_notifications(&mut model);

        let _ = execute!(stdout(), EnableMouseCapture);
        Self::event_loop(terminal, model)
    }

    fn event_loop(terminal: &mut DefaultTerminal, mut model: Model) -> Result<()> {
        let started = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(RESIZE_DEBOUNCE_MS);
        let mut file_watcher = if model.watch_enabled {
            match Self::make_file_watcher(&model) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    tracing::warn!("{err:#}");
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Error, format!("Watch unavailable: {err}"));
                    None
                }
            }
        } else {
            None
        };
        let mut needs_draw = true;

        loop {
            if needs_draw {
                let _draw_scope = crate::perf::scope("app.draw");
                terminal.draw(|frame| crate::ui::render(&model, frame))?;
                needs_draw = false;
            }

            let timeout = if resize_debouncer.is_pending() {
                Duration::from_millis(RESIZE_DEBOUNCE_MS)
            } else {
                POLL_INTERVAL
            };
            let mut messages = Vec::new();
            if event::poll(timeout)? {
                let now_ms = elapsed_ms(started);
                let ev = event::read()?;
                if let Some(msg) = Self::handle_event(ev, &model, now_ms, &mut resize_debouncer) {
                    messages.push(msg);
                }
            }
            if let Some((width, height)) = resize_debouncer.take_ready(elapsed_ms(started)) {
                messages.push(Message::Resize(width, height));
            }
            if file_watcher
                .as_mut()
                .is_some_and(FileWatcher::take_change_ready)
            {
                messages.push(Message::FileChanged);
            }

            if model.expire_toast() {
                needs_draw = true;
            }
            for msg in messages {
                tracing::trace!(?msg, "message");
                model = update(model, msg.clone());
                Self::handle_message_side_effects(&mut model, &mut file_watcher, &msg);
                needs_draw = true;
            }
            if model.should_quit {
                return Ok(());
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
