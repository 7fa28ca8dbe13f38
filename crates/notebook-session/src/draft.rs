//! Draft session: the note being authored in the editor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use notebook_core::{
    logging, Error, Extraction, Generated, Mindmap, Note, NoteId, NotePayload, NoteStore, Quiz,
    Result,
};
use tracing::{debug, field, info, instrument, Span};
use uuid::Uuid;

use crate::cache::NoteCollectionCache;

/// Editable draft fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Content,
}

/// Working copy of a note. Never aliases a cached note.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// Identifies one editor session; results for a closed session are dropped.
    pub session: Uuid,
    pub note_id: Option<NoteId>,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub quiz: Option<Quiz>,
    pub mindmap: Option<Mindmap>,
}

impl Draft {
    pub fn empty() -> Self {
        Self {
            session: Uuid::new_v4(),
            note_id: None,
            title: String::new(),
            content: String::new(),
            summary: None,
            quiz: None,
            mindmap: None,
        }
    }

    pub fn from_note(note: &Note) -> Self {
        Self {
            session: Uuid::new_v4(),
            note_id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            summary: note.summary.clone(),
            quiz: note.quiz.clone(),
            mindmap: note.mindmap.clone(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.note_id.is_none()
    }

    /// Wire form for create/update.
    pub fn payload(&self) -> Result<NotePayload> {
        NotePayload::build(
            &self.title,
            &self.content,
            self.summary.as_deref(),
            self.quiz.as_ref(),
            self.mindmap.as_ref(),
        )
    }
}

/// Holds the single draft and persists it through the note store.
pub struct DraftSession {
    store: Arc<dyn NoteStore>,
    cache: Arc<NoteCollectionCache>,
    current: Mutex<Option<Draft>>,
    saving: AtomicBool,
}

/// Clears the save-in-flight flag when dropped.
struct SaveInFlight<'a>(&'a AtomicBool);

impl Drop for SaveInFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DraftSession {
    pub fn new(store: Arc<dyn NoteStore>, cache: Arc<NoteCollectionCache>) -> Self {
        Self {
            store,
            cache,
            current: Mutex::new(None),
            saving: AtomicBool::new(false),
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<Draft>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_draft<T>(&self, f: impl FnOnce(&mut Draft) -> T) -> Result<T> {
        let mut guard = self.current();
        let draft = guard
            .as_mut()
            .ok_or_else(|| Error::State("no note is being edited".to_string()))?;
        Ok(f(draft))
    }

    /// Start a draft, empty or copied from `note`. Replaces any existing draft.
    pub fn init(&self, note: Option<&Note>) -> Uuid {
        let draft = note.map(Draft::from_note).unwrap_or_else(Draft::empty);
        let session = draft.session;
        debug!(session_id = %session, note_id = ?draft.note_id, "Draft started");
        *self.current() = Some(draft);
        session
    }

    pub fn snapshot(&self) -> Option<Draft> {
        self.current().clone()
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// Whether a save has been sent and has not returned yet.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.current().as_ref().map(|d| d.session)
    }

    pub fn update_field(&self, field: DraftField, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.with_draft(|d| match field {
            DraftField::Title => d.title = value,
            DraftField::Content => d.content = value,
        })
    }

    /// Attach a generated artifact to the draft of `session`.
    ///
    /// Fails with `Error::State` if that draft has been closed.
    pub fn attach_generated(&self, session: Uuid, generated: Generated) -> Result<()> {
        let mut guard = self.current();
        let draft = guard
            .as_mut()
            .filter(|d| d.session == session)
            .ok_or_else(|| Error::State("the draft was closed before the result arrived".to_string()))?;
        match generated {
            Generated::Summary(s) => draft.summary = Some(s),
            Generated::Quiz(q) => draft.quiz = Some(q),
            Generated::Mindmap(m) => draft.mindmap = Some(m),
        }
        Ok(())
    }

    /// Populate from an extraction: content is overwritten, title is only
    /// filled when blank.
    pub fn apply_extraction(&self, extraction: &Extraction) -> Result<()> {
        self.with_draft(|d| {
            d.content = extraction.text.clone();
            if d.title.trim().is_empty() {
                if let Some(title) = &extraction.suggested_title {
                    d.title = title.clone();
                }
            }
        })
    }

    /// Persist the draft: `create` when new, `update` otherwise.
    ///
    /// A created id is adopted in place so the draft becomes an existing
    /// note without leaving the editor. On failure the draft is unchanged.
    ///
    /// Only one save runs at a time; a second call while one is in flight
    /// fails with `Error::SaveInFlight` and sends nothing.
    #[instrument(skip(self), fields(subsystem = "session", component = "draft", op = "save", note_id = field::Empty))]
    pub async fn save(&self) -> Result<Note> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Save already in flight");
            return Err(Error::SaveInFlight);
        }
        let in_flight = SaveInFlight(&self.saving);

        let (session, note_id, payload) = {
            let guard = self.current();
            let draft = guard
                .as_ref()
                .ok_or_else(|| Error::State("no note is being edited".to_string()))?;
            (draft.session, draft.note_id, draft.payload()?)
        };

        let saved = match note_id {
            None => self.store.create(&payload).await?,
            Some(id) => self.store.update(id, &payload).await?,
        };

        if let Some(draft) = self.current().as_mut().filter(|d| d.session == session) {
            if draft.note_id.is_none() {
                draft.note_id = saved.id;
            }
            if draft.title.trim().is_empty() {
                draft.title = payload.title.clone();
            }
        }
        drop(in_flight);
        if let Some(id) = saved.id {
            Span::current().record(logging::NOTE_ID, field::display(id));
        }
        info!(created = note_id.is_none(), "Note saved");

        // The save already succeeded; a failed refresh only leaves the cache stale.
        let _ = self.cache.refresh_silently().await;
        Ok(saved)
    }

    /// Drop the draft.
    pub fn discard(&self) {
        if let Some(draft) = self.current().take() {
            debug!(session_id = %draft.session, "Draft discarded");
        }
    }
}
