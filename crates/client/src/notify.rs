//! User-facing notification surface.
//!
//! The client never renders anything itself; it publishes [`Notification`]s
//! to an injected [`Notifier`] and the embedding shell decides how to show
//! them (toast stack, status bar, nothing at all in headless use).

use tokio::sync::mpsc;

/// Visual severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the embedding shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Non-blocking user-visible message.
    Toast {
        severity: Severity,
        message: String,
    },
    /// The session token was rejected and has been cleared; the shell
    /// should navigate to its login view.
    SessionExpired,
}

/// Sink for notifications. Object-safe; share as `Arc<dyn Notifier>`.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn toast(&self, severity: Severity, message: &str) {
        self.notify(Notification::Toast {
            severity,
            message: message.to_string(),
        });
    }

    fn info(&self, message: &str) {
        self.toast(Severity::Info, message);
    }

    fn success(&self, message: &str) {
        self.toast(Severity::Success, message);
    }

    fn warning(&self, message: &str) {
        self.toast(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.toast(Severity::Error, message);
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Forwards notifications over an unbounded channel; the receiver half goes
/// to the UI shell (or a test asserting on what was shown).
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create the notifier and the receiving half.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.sender.send(notification);
    }
}
