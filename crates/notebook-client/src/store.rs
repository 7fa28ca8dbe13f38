//! HTTP implementation of the note store.

use std::time::Instant;

use async_trait::async_trait;
use notebook_core::{defaults, logging, Error, Note, NoteId, NotePayload, NoteStore, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, field, instrument, trace, warn, Span};

use crate::config::ClientConfig;
use crate::response::{check_status, log_completion, read_json};

/// Note store backed by the notes REST API.
#[derive(Debug, Clone)]
pub struct HttpNoteStore {
    client: Client,
    base_url: String,
}

impl HttpNoteStore {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.notes_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, defaults::NOTES_PATH)
    }

    fn note_url(&self, id: NoteId) -> String {
        format!("{}{}/{}", self.base_url, defaults::NOTES_PATH, id)
    }
}

#[async_trait]
impl NoteStore for HttpNoteStore {
    #[instrument(skip(self), fields(subsystem = "store", component = "http_store", op = "list", result_count = field::Empty))]
    async fn list(&self) -> Result<Vec<Note>> {
        let start = Instant::now();
        let response = self.client.get(self.collection_url()).send().await?;
        let body = read_json(check_status(response).await?).await?;
        let notes = normalize_note_list(body);
        log_completion(defaults::NOTES_PATH, start);
        Span::current().record(logging::RESULT_COUNT, notes.len());
        debug!("Listed notes");
        Ok(notes)
    }

    #[instrument(skip(self), fields(subsystem = "store", component = "http_store", op = "get", note_id = %id))]
    async fn get(&self, id: NoteId) -> Result<Note> {
        let start = Instant::now();
        let response = self.client.get(self.note_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id));
        }
        let body = read_json(check_status(response).await?).await?;
        let mut note: Note = serde_json::from_value(body)?;
        if note.id.is_none() {
            note.id = Some(id);
        }
        log_completion(defaults::NOTES_PATH, start);
        Ok(note)
    }

    #[instrument(skip(self, payload), fields(subsystem = "store", component = "http_store", op = "create", note_id = field::Empty))]
    async fn create(&self, payload: &NotePayload) -> Result<Note> {
        let start = Instant::now();
        let response = self
            .client
            .post(self.collection_url())
            .json(payload)
            .send()
            .await?;
        let body = read_json(check_status(response).await?).await?;
        let note = merge_response(body, None, payload)?;
        log_completion(defaults::NOTES_PATH, start);
        if let Some(id) = note.id {
            Span::current().record(logging::NOTE_ID, field::display(id));
        }
        debug!("Created note");
        Ok(note)
    }

    #[instrument(skip(self, payload), fields(subsystem = "store", component = "http_store", op = "update", note_id = %id))]
    async fn update(&self, id: NoteId, payload: &NotePayload) -> Result<Note> {
        let start = Instant::now();
        let response = self
            .client
            .put(self.note_url(id))
            .json(payload)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id));
        }
        let body = read_json(check_status(response).await?).await?;
        let note = merge_response(body, Some(id), payload)?;
        log_completion(defaults::NOTES_PATH, start);
        Ok(note)
    }

    #[instrument(skip(self), fields(subsystem = "store", component = "http_store", op = "delete", note_id = %id))]
    async fn delete(&self, id: NoteId) -> Result<()> {
        let start = Instant::now();
        let response = self.client.delete(self.note_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id));
        }
        check_status(response).await?;
        log_completion(defaults::NOTES_PATH, start);
        Ok(())
    }
}

/// Normalize a list response into notes, in backend order.
///
/// Accepts a bare array, `{"notes": [...]}`, or an object whose
/// object-valued members are notes. Anything else yields an empty list.
/// Entries that do not decode as notes are skipped.
pub fn normalize_note_list(body: Value) -> Vec<Note> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("notes") {
            Some(Value::Array(items)) => items,
            _ => {
                let items: Vec<Value> = map.into_iter().map(|(_, v)| v).filter(Value::is_object).collect();
                if items.is_empty() {
                    warn!("List response has no recognizable notes, treating as empty");
                } else {
                    warn!(result_count = items.len(), "List response is a keyed object, using its members as notes");
                }
                items
            }
        },
        other => {
            warn!(shape = %json_kind(&other), "Unexpected list response shape, treating as empty");
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Note>(item) {
            Ok(note) => {
                trace!(note_id = ?note.id, "Decoded note");
                Some(note)
            }
            Err(e) => {
                warn!(error = %e, "Skipping undecodable note in list response");
                None
            }
        })
        .collect()
}

/// Complete a create/update response with the payload that was sent.
///
/// The backend answers create with `{id, message}` and update with only
/// `{message}`; a full note in the body takes precedence.
fn merge_response(body: Value, known_id: Option<NoteId>, payload: &NotePayload) -> Result<Note> {
    let id = match body.get("id") {
        Some(raw) => serde_json::from_value::<NoteId>(raw.clone())
            .map_err(|e| Error::InvalidResponse(format!("malformed note id in response: {}", e)))?,
        None => known_id
            .ok_or_else(|| Error::InvalidResponse("response carries no note id".to_string()))?,
    };

    if body.get("content").is_some() {
        if let Ok(server_note) = serde_json::from_value::<Note>(body) {
            return Ok(Note {
                id: Some(id),
                ..server_note
            });
        }
    }
    Ok(Note::from_payload(id, payload))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
