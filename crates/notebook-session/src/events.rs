//! Session events and the broadcast bus renderers subscribe to.
//!
//! Every user-visible outcome (transient notifications, view changes, list
//! renders, upload progress) is published here. Emitting never fails: with
//! no subscribers the event is dropped.

use std::fmt;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::upload::UploadPhase;
use crate::view::ViewSnapshot;

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Events published by the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Notification(Notification),
    ViewEntered(ViewSnapshot),
    /// The note list was re-rendered from the cache.
    NotesRendered { count: usize },
    UploadPhaseChanged { phase: UploadPhase },
}

impl SessionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Notification(_) => "notification",
            Self::ViewEntered(_) => "view.entered",
            Self::NotesRendered { .. } => "notes.rendered",
            Self::UploadPhaseChanged { .. } => "upload.phase",
        }
    }
}

/// Broadcast bus for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: SessionEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Emit a notification.
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.emit(SessionEvent::Notification(Notification::new(level, message)));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
