//! Notifications emitted by a [`crate::document::Document`].
//!
//! Observers are plain closures or an `mpsc` receiver. Events are one-way:
//! the document never depends on what observers do with them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::time::Duration;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the document that emitted a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichTextEvent {
    /// The vertical offset moved. Not emitted when an operation clamps to
    /// the offset it already had.
    ScrollChanged { offset: usize, max: usize },
    LinkActivated { text: String, url: String },
    /// A search ran, was cleared, or its cursor moved.
    SearchResultsChanged {
        query: Option<String>,
        count: usize,
        current: Option<usize>,
    },
    /// Content was replaced and re-parsed.
    ContentChanged { elements: usize, lines: usize },
    /// An untagged code block was recognised.
    LanguageDetected { block: usize, language: String },
    /// The line buffer was recomputed.
    RenderCompleted { elapsed: Duration, line_count: usize },
}

/// An event tagged with its source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub document: DocumentId,
    pub event: RichTextEvent,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&Notification) -> bool>;

/// Registered observers of one document.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Observers {
    pub fn subscribe<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&Notification) + 'static,
    {
        self.insert(Box::new(move |notification| {
            callback(notification);
            true
        }))
    }

    /// Deliver notifications over a channel. The subscription is dropped once
    /// the receiver hangs up.
    pub fn subscribe_channel(&mut self) -> mpsc::Receiver<Notification> {
        let (tx, rx) = mpsc::channel();
        self.insert(Box::new(move |notification| tx.send(notification.clone()).is_ok()));
        rx
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn emit(&mut self, document: DocumentId, event: RichTextEvent) {
        if self.entries.is_empty() {
            return;
        }
        tracing::trace!(%document, ?event, "notify");
        let notification = Notification { document, event };
        self.entries
            .retain_mut(|(_, callback)| callback(&notification));
    }

    fn insert(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }
}
