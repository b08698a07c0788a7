//! Confirmation/notification surface.
//!
//! Decouples "an operation needs user confirmation or produced a result"
//! from any particular screen.  Each screen instance owns one surface;
//! at most one alert is visible on it, and issuing a new one replaces
//! the current -- a replaced pending confirmation resolves as cancel, so
//! the interrupted action sees `false` and takes no side effects.

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::debug;

/// Severity of a non-blocking notification.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// What a renderer shows for the current alert.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlertView {
    Notice {
        kind: NoticeKind,
        title: String,
        message: String,
    },
    Confirm {
        title: String,
        message: String,
    },
}

enum ActiveAlert {
    Notice {
        kind: NoticeKind,
        title: String,
        message: String,
    },
    Confirm {
        title: String,
        message: String,
        responder: oneshot::Sender<bool>,
    },
}

/// One screen instance's alert slot.
#[derive(Default)]
pub struct AlertSurface {
    current: Mutex<Option<ActiveAlert>>,
}

impl AlertSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the user to confirm; suspends until they respond.
    ///
    /// Returns `false` on cancel, dismissal, or replacement by a newer
    /// alert.
    pub async fn confirm(&self, title: impl Into<String>, message: impl Into<String>) -> bool {
        let (tx, rx) = oneshot::channel();
        self.replace(ActiveAlert::Confirm {
            title: title.into(),
            message: message.into(),
            responder: tx,
        });
        rx.await.unwrap_or(false)
    }

    /// Show a non-blocking notification.
    pub fn notify(
        &self,
        kind: NoticeKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.replace(ActiveAlert::Notice {
            kind,
            title: title.into(),
            message: message.into(),
        });
    }

    /// Resolve the visible alert: answers a pending confirmation, or
    /// simply clears a notification.
    pub fn respond(&self, accepted: bool) {
        let taken = self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(ActiveAlert::Confirm { responder, .. }) = taken {
            // receiver may have been dropped by an abandoned caller
            let _ = responder.send(accepted);
        }
    }

    /// Clear the visible alert; a pending confirmation resolves as cancel.
    pub fn dismiss(&self) {
        self.respond(false);
    }

    /// The alert currently visible, if any.
    pub fn current(&self) -> Option<AlertView> {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.as_ref().map(|alert| match alert {
            ActiveAlert::Notice {
                kind,
                title,
                message,
            } => AlertView::Notice {
                kind: *kind,
                title: title.clone(),
                message: message.clone(),
            },
            ActiveAlert::Confirm { title, message, .. } => AlertView::Confirm {
                title: title.clone(),
                message: message.clone(),
            },
        })
    }

    fn replace(&self, next: ActiveAlert) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ActiveAlert::Confirm { responder, .. }) = current.take() {
            debug!("replacing pending confirmation, resolving as cancel");
            let _ = responder.send(false);
        }
        *current = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn confirm_resolves_with_the_response() {
        let surface = Arc::new(AlertSurface::new());

        let pending = {
            let surface = surface.clone();
            tokio::spawn(async move { surface.confirm("Delete?", "This cannot be undone").await })
        };

        // wait for the dialog to appear, then accept it
        while surface.current().is_none() {
            tokio::task::yield_now().await;
        }
        surface.respond(true);

        assert!(pending.await.unwrap());
        assert!(surface.current().is_none());
    }

    #[tokio::test]
    async fn dismiss_is_cancel() {
        let surface = Arc::new(AlertSurface::new());

        let pending = {
            let surface = surface.clone();
            tokio::spawn(async move { surface.confirm("Delete?", "...").await })
        };

        while surface.current().is_none() {
            tokio::task::yield_now().await;
        }
        surface.dismiss();

        assert!(!pending.await.unwrap());
    }

    #[tokio::test]
    async fn new_alert_replaces_pending_confirmation_as_cancel() {
        let surface = Arc::new(AlertSurface::new());

        let pending = {
            let surface = surface.clone();
            tokio::spawn(async move { surface.confirm("Delete?", "...").await })
        };

        while surface.current().is_none() {
            tokio::task::yield_now().await;
        }
        surface.notify(NoticeKind::Success, "Saved", "Record saved");

        assert!(!pending.await.unwrap());
        assert!(matches!(
            surface.current(),
            Some(AlertView::Notice {
                kind: NoticeKind::Success,
                ..
            })
        ));
    }

    #[test]
    fn notifications_replace_without_queueing() {
        let surface = AlertSurface::new();
        surface.notify(NoticeKind::Info, "First", "...");
        surface.notify(NoticeKind::Error, "Second", "...");

        match surface.current() {
            Some(AlertView::Notice { kind, title, .. }) => {
                assert_eq!(kind, NoticeKind::Error);
                assert_eq!(title, "Second");
            }
            other => panic!("unexpected alert: {other:?}"),
        }
    }
}
