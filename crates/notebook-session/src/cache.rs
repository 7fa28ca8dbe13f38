//! In-memory mirror of the remote note collection.

use std::sync::{Arc, Mutex, MutexGuard};

use notebook_core::{Note, NoteId, NoteStore, Result};
use tracing::{debug, instrument, warn};

use crate::events::{EventBus, NotificationLevel, SessionEvent};

/// Cached note list in backend order. Refreshes replace the whole sequence;
/// concurrent refreshes race and the last to complete wins.
pub struct NoteCollectionCache {
    store: Arc<dyn NoteStore>,
    notes: Mutex<Vec<Note>>,
    events: EventBus,
}

impl NoteCollectionCache {
    pub fn new(store: Arc<dyn NoteStore>, events: EventBus) -> Self {
        Self {
            store,
            notes: Mutex::new(Vec::new()),
            events,
        }
    }

    fn notes(&self) -> MutexGuard<'_, Vec<Note>> {
        self.notes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reload from the store and re-render the list.
    ///
    /// On failure the previous contents are kept and an error notification
    /// is emitted.
    #[instrument(skip(self), fields(subsystem = "session", component = "cache", op = "refresh"))]
    pub async fn refresh(&self) -> Result<usize> {
        match self.reload().await {
            Ok(count) => {
                self.events.emit(SessionEvent::NotesRendered { count });
                Ok(count)
            }
            Err(e) => {
                self.events.notify(
                    NotificationLevel::Error,
                    format!("Failed to load notes: {}", e),
                );
                Err(e)
            }
        }
    }

    /// Reload from the store without re-rendering.
    #[instrument(skip(self), fields(subsystem = "session", component = "cache", op = "refresh_silently"))]
    pub async fn refresh_silently(&self) -> Result<usize> {
        self.reload().await.inspect_err(|e| {
            warn!(error = %e, "Silent cache refresh failed, keeping previous notes");
        })
    }

    async fn reload(&self) -> Result<usize> {
        let fresh = self.store.list().await?;
        let count = fresh.len();
        *self.notes() = fresh;
        debug!(result_count = count, "Note cache replaced");
        Ok(count)
    }

    pub fn all(&self) -> Vec<Note> {
        self.notes().clone()
    }

    /// Local lookup; never touches the network.
    pub fn find_by_id(&self, id: NoteId) -> Option<Note> {
        self.notes().iter().find(|n| n.id == Some(id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.notes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes().is_empty()
    }
}
