//! Lightweight performance instrumentation.
//!
//! Scopes always measure; they only report through `tracing` when timing is
//! switched on with `--perf`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Measures the time until it is dropped.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Scope {
    /// Time since the scope was opened.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(target: "richview::perf", scope = self.name, elapsed_ms, "timing");
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Record a named event with free-form detail when timing is on.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    if !is_enabled() {
        return;
    }
    tracing::info!(target: "richview::perf", event = name, detail = detail.as_ref());
}
