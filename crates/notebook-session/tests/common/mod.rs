//! Recording test doubles for the session integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notebook_core::{
    AiService, Branch, Error, Extraction, McqQuestion, Mindmap, Note, NoteId, NotePayload,
    NoteStore, Quiz, Result, UploadFile,
};
use notebook_session::{
    Notification, NotificationLevel, SessionConfig, SessionController, SessionEvent,
};
use tokio::sync::{broadcast, Notify};

pub fn id(raw: i64) -> NoteId {
    NoteId::new(raw).unwrap()
}

pub fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, "application/pdf", b"%PDF-1.4 test".to_vec())
}

// =============================================================================
// NOTE STORE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List,
    Get(NoteId),
    Create(NotePayload),
    Update(NoteId, NotePayload),
    Delete(NoteId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Get,
    Create,
    Update,
    Delete,
}

/// In-memory note store that records every call.
#[derive(Default)]
pub struct MockNoteStore {
    notes: Mutex<Vec<Note>>,
    next_id: Mutex<i64>,
    failing: Mutex<HashSet<StoreOp>>,
    calls: Mutex<Vec<StoreCall>>,
    write_gate: Option<Arc<Notify>>,
    omit_created_ids: bool,
}

impl MockNoteStore {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
            ..Default::default()
        }
    }

    /// Seed a note with the next free id.
    pub fn with_note(self, title: &str, content: &str) -> Self {
        {
            let mut next = self.next_id.lock().unwrap();
            self.notes.lock().unwrap().push(Note {
                id: Some(id(*next)),
                title: title.to_string(),
                content: content.to_string(),
                ..Default::default()
            });
            *next += 1;
        }
        self
    }

    /// Hold `create` and `update` until the gate is notified.
    pub fn with_write_gate(mut self, gate: Arc<Notify>) -> Self {
        self.write_gate = Some(gate);
        self
    }

    /// Answer `create` with a note that carries no id.
    pub fn without_created_ids(mut self) -> Self {
        self.omit_created_ids = true;
        self
    }

    async fn wait_for_write(&self) {
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
    }

    pub fn set_failing(&self, op: StoreOp, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(op);
        } else {
            set.remove(&op);
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Create(_)))
            .count()
    }

    pub fn update_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Update(..)))
            .count()
    }

    pub fn stored(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    fn record(&self, call: StoreCall, op: StoreOp) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(Error::Server {
                status: 500,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MockNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        self.record(StoreCall::List, StoreOp::List)?;
        Ok(self.stored())
    }

    async fn get(&self, note_id: NoteId) -> Result<Note> {
        self.record(StoreCall::Get(note_id), StoreOp::Get)?;
        self.stored()
            .into_iter()
            .find(|n| n.id == Some(note_id))
            .ok_or(Error::NotFound(note_id))
    }

    async fn create(&self, payload: &NotePayload) -> Result<Note> {
        self.record(StoreCall::Create(payload.clone()), StoreOp::Create)?;
        self.wait_for_write().await;
        let new_id = {
            let mut next = self.next_id.lock().unwrap();
            let new_id = id(*next);
            *next += 1;
            new_id
        };
        let note = Note::from_payload(new_id, payload);
        self.notes.lock().unwrap().push(note.clone());
        if self.omit_created_ids {
            return Ok(Note { id: None, ..note });
        }
        Ok(note)
    }

    async fn update(&self, note_id: NoteId, payload: &NotePayload) -> Result<Note> {
        self.record(StoreCall::Update(note_id, payload.clone()), StoreOp::Update)?;
        self.wait_for_write().await;
        let note = Note::from_payload(note_id, payload);
        let mut notes = self.notes.lock().unwrap();
        let slot = notes
            .iter_mut()
            .find(|n| n.id == Some(note_id))
            .ok_or(Error::NotFound(note_id))?;
        *slot = note.clone();
        Ok(note)
    }

    async fn delete(&self, note_id: NoteId) -> Result<()> {
        self.record(StoreCall::Delete(note_id), StoreOp::Delete)?;
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| n.id != Some(note_id));
        if notes.len() == before {
            return Err(Error::NotFound(note_id));
        }
        Ok(())
    }
}

// =============================================================================
// AI SERVICE
// =============================================================================

/// Scripted AI service. Extraction can be held at a gate so tests can
/// observe the session while an upload is in flight.
pub struct MockAiService {
    extraction: Mutex<Result<Extraction>>,
    extract_gate: Option<Arc<Notify>>,
    fail_generation: bool,
    calls: Mutex<Vec<String>>,
}

impl MockAiService {
    pub fn new() -> Self {
        Self {
            extraction: Mutex::new(Ok(Extraction {
                text: "Hello world".to_string(),
                suggested_title: Some("Hello".to_string()),
                page_count: Some(1),
                endpoint: "/api/extract-pdf-text".to_string(),
            })),
            extract_gate: None,
            fail_generation: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_extraction(self, extraction: Result<Extraction>) -> Self {
        *self.extraction.lock().unwrap() = extraction;
        self
    }

    pub fn with_extract_gate(mut self, gate: Arc<Notify>) -> Self {
        self.extract_gate = Some(gate);
        self
    }

    pub fn with_failing_generation(mut self) -> Self {
        self.fail_generation = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation("Please enter some content first".to_string()));
        }
        self.calls.lock().unwrap().push(op.to_string());
        if self.fail_generation {
            return Err(Error::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AiService for MockAiService {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.record("summarize", text)?;
        Ok(format!("Summary of {} characters", text.chars().count()))
    }

    async fn generate_quiz(&self, text: &str) -> Result<Quiz> {
        self.record("quiz", text)?;
        Ok(Quiz {
            mcq: Some(vec![McqQuestion {
                question: "What is greeted?".to_string(),
                options: vec!["world".to_string(), "moon".to_string()],
                answer: "world".to_string(),
            }]),
            ..Default::default()
        })
    }

    async fn generate_mindmap(&self, text: &str) -> Result<Mindmap> {
        self.record("mindmap", text)?;
        Ok(Mindmap {
            central: "Greeting".to_string(),
            branches: vec![Branch {
                topic: "World".to_string(),
                subtopics: vec![],
            }],
        })
    }

    async fn extract_text(&self, file: &UploadFile) -> Result<Extraction> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("extract:{}", file.file_name));
        if let Some(gate) = &self.extract_gate {
            gate.notified().await;
        }
        match &*self.extraction.lock().unwrap() {
            Ok(x) => Ok(x.clone()),
            Err(e) => Err(Error::Network(e.to_string())),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail_generation)
    }
}

// =============================================================================
// HARNESS
// =============================================================================

pub struct Harness {
    pub store: Arc<MockNoteStore>,
    pub ai: Arc<MockAiService>,
    pub controller: Arc<SessionController>,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl Harness {
    pub fn new(store: MockNoteStore, ai: MockAiService) -> Self {
        Self::with_config(store, ai, SessionConfig::default())
    }

    pub fn with_config(store: MockNoteStore, ai: MockAiService, config: SessionConfig) -> Self {
        let store = Arc::new(store);
        let ai = Arc::new(ai);
        let controller = Arc::new(SessionController::new(store.clone(), ai.clone(), config));
        let events = controller.subscribe();
        Self {
            store,
            ai,
            controller,
            events,
        }
    }

    /// Everything published since the last drain.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn notifications(&mut self) -> Vec<Notification> {
        self.drain()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Notification(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&mut self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.level == NotificationLevel::Warning)
            .map(|n| n.message)
            .collect()
    }
}
