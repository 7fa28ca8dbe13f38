//! # notebook-core
//!
//! Core types, traits, and abstractions for the notebook client.
//!
//! This crate provides the data model shared by the HTTP clients and the
//! session layer, plus the collaborator traits the session depends on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ErrorKind, Result};
pub use file_safety::{detect_content_type, is_pdf_mime, validate_upload, UploadFile};
pub use models::*;
pub use traits::*;
