//! Collaborator traits for the notebook session.
//!
//! The session talks to the notes backend and the AI service only through
//! these traits, so HTTP clients and test doubles are interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::file_safety::UploadFile;
use crate::models::*;

// =============================================================================
// NOTE STORE
// =============================================================================

/// Remote persistence of notes.
///
/// Updates are full-document replaces; every call is independent and
/// side-effect free on the client.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Fetch every note, in server order.
    async fn list(&self) -> Result<Vec<Note>>;

    /// Fetch one note. Unknown ids fail with `Error::NotFound`.
    async fn get(&self, id: NoteId) -> Result<Note>;

    /// Create a note and return it with its server-assigned id.
    async fn create(&self, payload: &NotePayload) -> Result<Note>;

    /// Replace an existing note.
    async fn update(&self, id: NoteId, payload: &NotePayload) -> Result<Note>;

    /// Delete a note.
    async fn delete(&self, id: NoteId) -> Result<()>;
}

// =============================================================================
// AI SERVICE
// =============================================================================

/// Text transformation and document extraction.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Summarize non-empty text.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Generate a quiz from non-empty text.
    async fn generate_quiz(&self, text: &str) -> Result<Quiz>;

    /// Generate a mind map from non-empty text.
    async fn generate_mindmap(&self, text: &str) -> Result<Mindmap>;

    /// Extract text from a document, trying each configured endpoint in order.
    async fn extract_text(&self, file: &UploadFile) -> Result<Extraction>;

    /// Probe the service. Transport failures report `Ok(false)`.
    async fn health_check(&self) -> Result<bool>;
}
