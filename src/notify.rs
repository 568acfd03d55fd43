//! Non-fatal failure notifications
//!
//! Background cache failures never reject the caller. They are reported to a
//! [`Notifier`] as a `(title, description)` pair and the operation degrades.

use std::sync::Mutex;

/// A user-facing notification about a degraded background operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub(crate) fn entity_batch_failed() -> Self {
        Self::new(
            "Failed to load entities",
            "Unable to fetch entity data from server.",
        )
    }

    pub(crate) fn category_failed() -> Self {
        Self::new("Filter error", "Unable to load categories for filtering.")
    }

    pub(crate) fn directory_failed() -> Self {
        Self::new("Initialization failed", "Unable to load the catalog directory.")
    }
}

/// Receives notifications. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to the `tracing` log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::warn!("{}: {}", notification.title, notification.description);
    }
}

/// Keeps every notification in memory (used by tests and the CLI summary)
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far
    pub fn received(&self) -> Vec<Notification> {
        match self.received.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.received().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!("Recorded notification: {}", notification.title);
        match self.received.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
