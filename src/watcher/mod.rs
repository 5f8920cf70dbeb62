//! Live reload of the viewed file.
//!
//! The OS reports changes through `notify`. Bursts of events (editors often
//! write, rename and touch in quick succession) are collapsed into a single
//! reload once the file has been quiet for the debounce interval.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Quiet period before a change is reported.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Where a watcher stands after draining its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Idle,
    /// Changes seen, still inside the debounce window
    Pending,
    /// The file settled; reload it now
    Ready,
}

/// Watches one file through its parent directory.
///
/// Watching the directory rather than the file survives editors that save
/// by replacing the file.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    directory: PathBuf,
    path: PathBuf,
    file_name: Option<OsString>,
    debounce: Duration,
    last_change: Option<Instant>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("path", &self.path)
            .field("debounce", &self.debounce)
            .field("pending", &self.last_change.is_some())
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Start watching `path`.
    ///
    /// # Errors
    /// Fails if the platform watcher cannot be created or the parent
    /// directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> Result<Self> {
        // Event paths from the OS are canonical, so ours must be too.
        let path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let file_name = path.file_name().map(std::ffi::OsStr::to_os_string);
        let directory = parent_directory(&path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .context("failed to create file watcher")?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", directory.display()))?;
        tracing::debug!(path = %path.display(), ?debounce, "watching file");

        Ok(Self {
            _watcher: watcher,
            rx,
            directory,
            path,
            file_name,
            debounce,
            last_change: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending events and report whether a reload is due.
    pub fn poll(&mut self) -> WatchStatus {
        self.poll_at(Instant::now())
    }

    /// True once a debounced change is ready. Shorthand for [`Self::poll`].
    pub fn take_change_ready(&mut self) -> bool {
        self.poll() == WatchStatus::Ready
    }

    /// Read the watched file.
    ///
    /// # Errors
    /// Fails if the file is missing or not valid UTF-8.
    pub fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))
    }

    fn poll_at(&mut self, now: Instant) -> WatchStatus {
        let mut relevant = 0u32;
        let mut ignored = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(event) if self.is_relevant(&event) => relevant += 1,
                Ok(event) => {
                    ignored += 1;
                    tracing::trace!(kind = ?event.kind, paths = ?event.paths, "ignored fs event");
                }
                Err(err) => tracing::warn!(%err, "file watcher error"),
            }
        }
        if relevant + ignored > 0 {
            tracing::debug!(relevant, ignored, path = %self.path.display(), "fs events");
        }
        if relevant > 0 {
            self.last_change = Some(now);
        }
        self.settle(now)
    }

    fn settle(&mut self, now: Instant) -> WatchStatus {
        match self.last_change {
            None => WatchStatus::Idle,
            Some(at) if now.saturating_duration_since(at) >= self.debounce => {
                self.last_change = None;
                WatchStatus::Ready
            }
            Some(_) => WatchStatus::Pending,
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.directory
                || path == &self.path
                || self
                    .file_name
                    .as_ref()
                    .is_some_and(|name| path.file_name() == Some(name.as_os_str()))
        })
    }
}

fn parent_directory(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn event(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Any,
            paths,
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_event_counts_for_watched_file() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("doc.md");
        std::fs::write(&path, "hi").expect("write");
        let watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        assert!(watcher.is_relevant(&event(vec![canonical_dir.clone()])));
        assert!(watcher.is_relevant(&event(vec![path])));
        assert!(!watcher.is_relevant(&event(vec![canonical_dir.join("other.md")])));
    }

    #[test]
    fn test_relative_file_watches_current_directory() {
        assert_eq!(parent_directory(Path::new("notes.md")), PathBuf::from("."));
    }

    #[test]
    fn test_debounce_window() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "a").expect("write");
        let mut watcher = FileWatcher::new(&path, Duration::from_millis(100)).expect("watcher");

        let start = Instant::now();
        assert_eq!(watcher.settle(start), WatchStatus::Idle);
        watcher.last_change = Some(start);
        assert_eq!(
            watcher.settle(start + Duration::from_millis(50)),
            WatchStatus::Pending
        );
        assert_eq!(
            watcher.settle(start + Duration::from_millis(100)),
            WatchStatus::Ready
        );
        assert_eq!(
            watcher.settle(start + Duration::from_millis(150)),
            WatchStatus::Idle
        );
    }

    #[test]
    fn test_read_returns_current_content() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# One").expect("write");
        let watcher = FileWatcher::new(&path, DEFAULT_DEBOUNCE).expect("watcher");
        std::fs::write(&path, "# Two").expect("write");
        assert_eq!(watcher.read().expect("read"), "# Two");
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().canonicalize().expect("canonicalize").join("watched.md");
        std::fs::write(&path, "original").expect("write");
        let mut watcher = FileWatcher::new(&path, Duration::from_millis(50)).expect("watcher");

        // Let the backend register the watch
        std::thread::sleep(Duration::from_millis(500));
        std::fs::write(&path, "modified").expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(detected, "modification should be reported within 5 seconds");
    }

    #[test]
    fn test_missing_file_errors_on_read() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gone.md");
        std::fs::write(&path, "x").expect("write");
        let watcher = FileWatcher::new(&path, DEFAULT_DEBOUNCE).expect("watcher");
        std::fs::remove_file(&path).expect("remove");
        assert!(watcher.read().is_err());
    }
}
