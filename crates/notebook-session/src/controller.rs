//! The session controller: one object owning every piece of editor state.
//!
//! All operations take `&self`. State sits behind short-lived locks that are
//! never held across an await, so operations may interleave at network
//! calls the same way UI events interleave with I/O completions.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use notebook_core::{AiService, Error, Generated, Note, NoteId, NoteStore, Result, UploadFile};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::cache::NoteCollectionCache;
use crate::config::SessionConfig;
use crate::draft::{Draft, DraftField, DraftSession};
use crate::events::{EventBus, NotificationLevel, SessionEvent};
use crate::local_state::{LocalStateStore, Theme};
use crate::upload::{UploadCoordinator, UploadOutcome, UploadPhase, UploadTimings};
use crate::view::{Transition, View, ViewAction, ViewCoordinator, ViewSnapshot};

/// AI artifacts that can be generated for the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Summary,
    Quiz,
    Mindmap,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Quiz => write!(f, "quiz"),
            Self::Mindmap => write!(f, "mind map"),
        }
    }
}

pub struct SessionController {
    store: Arc<dyn NoteStore>,
    ai: Arc<dyn AiService>,
    cache: Arc<NoteCollectionCache>,
    draft: DraftSession,
    upload: UploadCoordinator,
    view: Mutex<ViewCoordinator>,
    viewed: Mutex<Option<Note>>,
    local: Arc<LocalStateStore>,
    events: EventBus,
    config: SessionConfig,
}

impl SessionController {
    pub fn new(store: Arc<dyn NoteStore>, ai: Arc<dyn AiService>, config: SessionConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        let local = Arc::new(match &config.state_path {
            Some(path) => LocalStateStore::open(path),
            None => LocalStateStore::in_memory(),
        });
        let cache = Arc::new(NoteCollectionCache::new(store.clone(), events.clone()));
        let draft = DraftSession::new(store.clone(), cache.clone());
        let upload = UploadCoordinator::new(
            ai.clone(),
            local.clone(),
            events.clone(),
            UploadTimings {
                grace_period: config.grace_period,
                busy_release_delay: config.busy_release_delay,
                max_upload_bytes: config.max_upload_bytes,
            },
        );

        Self {
            store,
            ai,
            cache,
            draft,
            upload,
            view: Mutex::new(ViewCoordinator::new()),
            viewed: Mutex::new(None),
            local,
            events,
            config,
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────────

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn cache(&self) -> &NoteCollectionCache {
        &self.cache
    }

    pub fn local_state(&self) -> &LocalStateStore {
        &self.local
    }

    pub fn active_view(&self) -> View {
        self.view().active()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.view().snapshot()
    }

    /// Copy of the current draft, if the editor is open.
    pub fn draft(&self) -> Option<Draft> {
        self.draft.snapshot()
    }

    /// The note shown in the detail view.
    pub fn viewed_note(&self) -> Option<Note> {
        self.viewed().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.upload.busy().is_busy()
    }

    pub fn in_grace_period(&self) -> bool {
        self.upload.grace().is_active()
    }

    pub fn upload_phase(&self) -> UploadPhase {
        self.upload.phase()
    }

    fn view(&self) -> MutexGuard<'_, ViewCoordinator> {
        self.view.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn viewed(&self) -> MutexGuard<'_, Option<Note>> {
        self.viewed.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ─── Transition plumbing ──────────────────────────────────────────────

    /// Resolve `action` against the active view. `Ok(None)` means the busy
    /// flag refused it; a warning has been emitted.
    fn guard(&self, action: ViewAction) -> Result<Option<View>> {
        if self.is_busy() {
            warn!(action = %action, view = %self.active_view(), "Transition rejected while busy");
            self.events
                .notify(NotificationLevel::Warning, Error::Busy.to_string());
            return Ok(None);
        }
        self.view().resolve(action).map(Some)
    }

    fn rejected(&self) -> Transition {
        self.rejected_with(Error::Busy)
    }

    fn rejected_with(&self, reason: Error) -> Transition {
        Transition::Rejected {
            view: self.active_view(),
            reason: reason.to_string(),
        }
    }

    /// Make `target` the visible view and reset state scoped to the view
    /// being left.
    fn enter(&self, target: View) -> ViewSnapshot {
        let (from, snapshot) = {
            let mut view = self.view();
            let from = view.active();
            (from, view.enter(target))
        };

        if from == View::Editor && target != View::Editor {
            self.draft.discard();
            self.upload.reset();
            self.local.clear_recovery();
        }
        if from == View::Detail && target != View::Detail {
            *self.viewed() = None;
        }

        self.events.emit(SessionEvent::ViewEntered(snapshot));
        snapshot
    }

    async fn enter_list(&self) -> Transition {
        self.enter(View::List);
        // A failed refresh has already been reported; the list keeps its
        // previous contents.
        let _ = self.cache.refresh().await;
        Transition::Entered(View::List)
    }

    /// Viewed note, then cache, then the store.
    async fn load_note(&self, id: NoteId) -> Result<Note> {
        if let Some(note) = self.viewed().as_ref().filter(|n| n.id == Some(id)) {
            return Ok(note.clone());
        }
        if let Some(note) = self.cache.find_by_id(id) {
            return Ok(note);
        }
        self.store.get(id).await.inspect_err(|e| {
            self.events.notify(
                NotificationLevel::Error,
                format!("Failed to load note: {}", e),
            );
        })
    }

    // ─── Navigation ───────────────────────────────────────────────────────

    /// Enter the list view and render it from a fresh fetch.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "show_list"))]
    pub async fn show_list(&self) -> Result<Transition> {
        if self.guard(ViewAction::ShowList)?.is_none() {
            return Ok(self.rejected());
        }
        Ok(self.enter_list().await)
    }

    /// Open the editor on an empty draft.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "new_note"))]
    pub async fn new_note(&self) -> Result<Transition> {
        let Some(target) = self.guard(ViewAction::NewNote)? else {
            return Ok(self.rejected());
        };
        self.enter(target);
        self.draft.init(None);
        Ok(Transition::Entered(target))
    }

    /// Open the editor on a copy of note `id`.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "edit_note", note_id = %id))]
    pub async fn edit_note(&self, id: NoteId) -> Result<Transition> {
        if self.guard(ViewAction::EditNote)?.is_none() {
            return Ok(self.rejected());
        }
        let note = self.load_note(id).await?;
        let Some(target) = self.guard(ViewAction::EditNote)? else {
            return Ok(self.rejected());
        };
        self.enter(target);
        self.draft.init(Some(&note));
        Ok(Transition::Entered(target))
    }

    /// Show note `id` read-only.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "view_note", note_id = %id))]
    pub async fn view_note(&self, id: NoteId) -> Result<Transition> {
        if self.guard(ViewAction::ViewNote)?.is_none() {
            return Ok(self.rejected());
        }
        let note = self.load_note(id).await?;
        let Some(target) = self.guard(ViewAction::ViewNote)? else {
            return Ok(self.rejected());
        };
        *self.viewed() = Some(note);
        self.enter(target);
        Ok(Transition::Entered(target))
    }

    /// Detail -> List.
    pub async fn back(&self) -> Result<Transition> {
        if self.guard(ViewAction::Back)?.is_none() {
            return Ok(self.rejected());
        }
        Ok(self.enter_list().await)
    }

    /// Leave the editor without saving.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "cancel_edit"))]
    pub async fn cancel_edit(&self) -> Result<Transition> {
        if self.guard(ViewAction::Cancel)?.is_none() {
            return Ok(self.rejected());
        }
        Ok(self.enter_list().await)
    }

    // ─── Draft ────────────────────────────────────────────────────────────

    fn require_editor(&self, what: &str) -> Result<()> {
        if self.active_view() != View::Editor || !self.draft.is_active() {
            return Err(Error::State(format!("{} requires an open editor", what)));
        }
        Ok(())
    }

    pub fn update_field(&self, field: DraftField, value: impl Into<String>) -> Result<()> {
        self.require_editor("editing")?;
        self.draft.update_field(field, value)
    }

    /// Manual save from the editor form.
    ///
    /// Refused while busy. After a successful save the editor closes unless
    /// an upload is in flight or the post-upload grace period is active.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "save"))]
    pub async fn save(&self) -> Result<Transition> {
        self.view().resolve(ViewAction::SaveAndLeave)?;
        if self.is_busy() {
            warn!("Save rejected while busy");
            self.events
                .notify(NotificationLevel::Warning, Error::Busy.to_string());
            return Ok(self.rejected());
        }

        match self.draft.save().await {
            Ok(_) => {}
            Err(Error::SaveInFlight) => {
                warn!("Save rejected, previous save still in flight");
                self.events
                    .notify(NotificationLevel::Warning, Error::SaveInFlight.to_string());
                return Ok(self.rejected_with(Error::SaveInFlight));
            }
            Err(e) => {
                self.events.notify(
                    NotificationLevel::Error,
                    format!("Error saving note: {}", e),
                );
                return Err(e);
            }
        }
        self.events
            .notify(NotificationLevel::Success, "Note saved successfully!");

        if self.is_busy() || self.in_grace_period() {
            debug!(
                busy = self.is_busy(),
                grace = self.in_grace_period(),
                "Staying in editor after save"
            );
            return Ok(Transition::Stayed(View::Editor));
        }
        if self.active_view() != View::Editor {
            return Ok(Transition::Entered(self.active_view()));
        }
        Ok(self.enter_list().await)
    }

    /// Generate an AI artifact from the draft content and attach it.
    ///
    /// On failure the draft is left untouched.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "generate", kind = %kind))]
    pub async fn generate(&self, kind: ArtifactKind) -> Result<Generated> {
        self.require_editor("generating")?;
        let draft = self
            .draft
            .snapshot()
            .ok_or_else(|| Error::State("no note is being edited".to_string()))?;

        let result = match kind {
            ArtifactKind::Summary => self.ai.summarize(&draft.content).await.map(Generated::Summary),
            ArtifactKind::Quiz => self.ai.generate_quiz(&draft.content).await.map(Generated::Quiz),
            ArtifactKind::Mindmap => self
                .ai
                .generate_mindmap(&draft.content)
                .await
                .map(Generated::Mindmap),
        };

        match result {
            Ok(generated) => {
                self.draft.attach_generated(draft.session, generated.clone())?;
                info!(kind = generated.kind(), "Attached generated artifact");
                self.events.notify(
                    NotificationLevel::Success,
                    format!("{} generated successfully!", capitalize(&kind.to_string())),
                );
                Ok(generated)
            }
            Err(e) => {
                let level = match e {
                    Error::Validation(_) => NotificationLevel::Warning,
                    _ => NotificationLevel::Error,
                };
                self.events
                    .notify(level, format!("Error generating {}: {}", kind, e));
                Err(e)
            }
        }
    }

    // ─── Upload ───────────────────────────────────────────────────────────

    /// Run the upload protocol for `file` against the open draft.
    pub async fn upload(&self, file: UploadFile) -> Result<UploadOutcome> {
        self.require_editor("uploading")?;
        if self.draft.is_saving() {
            warn!("Upload rejected, save still in flight");
            self.events
                .notify(NotificationLevel::Warning, Error::SaveInFlight.to_string());
            return Ok(UploadOutcome::Rejected);
        }
        Ok(self.upload.run(file, &self.draft).await)
    }

    /// Re-open the note created by the last upload if its marker is still
    /// fresh. The marker is consumed either way.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "resume"))]
    pub async fn resume(&self) -> Result<Option<NoteId>> {
        if self.guard(ViewAction::Resume)?.is_none() {
            return Ok(None);
        }
        let Some(id) = self.local.take_fresh_recovery(self.config.recovery_window) else {
            return Ok(None);
        };

        let note = match self.store.get(id).await {
            Ok(note) => note,
            Err(Error::NotFound(_)) => {
                warn!(note_id = %id, "Recovered note no longer exists");
                return Ok(None);
            }
            Err(e) => {
                self.events.notify(
                    NotificationLevel::Error,
                    format!("Failed to reopen the last note: {}", e),
                );
                return Err(e);
            }
        };

        let Some(target) = self.guard(ViewAction::Resume)? else {
            return Ok(None);
        };
        self.enter(target);
        self.draft.init(Some(&note));
        self.events.notify(
            NotificationLevel::Info,
            format!("Reopened \"{}\"", note.title),
        );
        Ok(Some(id))
    }

    /// Startup: resume the last uploaded note if possible, otherwise show
    /// the list. Returns the view entered.
    pub async fn start(&self) -> Result<View> {
        match self.resume().await {
            Ok(Some(_)) => return Ok(View::Editor),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Resume failed, showing the note list"),
        }
        self.show_list().await?;
        Ok(self.active_view())
    }

    // ─── Detail ───────────────────────────────────────────────────────────

    /// Delete the note shown in the detail view and return to the list.
    #[instrument(skip(self), fields(subsystem = "session", component = "controller", op = "delete_viewed_note"))]
    pub async fn delete_viewed_note(&self) -> Result<Transition> {
        if self.guard(ViewAction::DeleteViewed)?.is_none() {
            return Ok(self.rejected());
        }
        let id = self
            .viewed()
            .as_ref()
            .and_then(|n| n.id)
            .ok_or_else(|| Error::State("no saved note is being viewed".to_string()))?;

        if let Err(e) = self.store.delete(id).await {
            self.events.notify(
                NotificationLevel::Error,
                format!("Error deleting note: {}", e),
            );
            return Err(e);
        }
        info!(note_id = %id, "Note deleted");
        self.events
            .notify(NotificationLevel::Success, "Note deleted successfully!");

        if self.active_view() == View::Detail {
            Ok(self.enter_list().await)
        } else {
            let _ = self.cache.refresh_silently().await;
            Ok(Transition::Stayed(self.active_view()))
        }
    }

    // ─── Preferences and status ───────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.local.theme()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.local.set_theme(theme);
    }

    pub fn toggle_theme(&self) -> Theme {
        self.local.toggle_theme()
    }

    /// Whether the AI service answers its status probe.
    pub async fn backend_status(&self) -> Result<bool> {
        self.ai.health_check().await
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
