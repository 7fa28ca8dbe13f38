//! # notebook-client
//!
//! HTTP clients for the notes backend and the AI service.
//!
//! - [`HttpNoteStore`]: note CRUD over the REST API
//! - [`HttpAiService`]: summary, quiz, mind map and document extraction
//! - [`FallbackChain`]: ordered first-success-wins endpoint fallback

pub mod ai;
pub mod config;
pub mod fallback;
mod response;
pub mod store;

pub use ai::HttpAiService;
pub use config::{ClientConfig, ConfigError};
pub use fallback::FallbackChain;
pub use store::{normalize_note_list, HttpNoteStore};
