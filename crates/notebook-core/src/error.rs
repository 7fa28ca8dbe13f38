//! Error types for the notebook client.

use std::fmt;

use thiserror::Error;

use crate::models::NoteId;

/// Result type alias using the notebook Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notebook operations.
///
/// Every failure of the leaf clients resolves to one of these variants; none
/// of them are fatal to the session.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input rejected before any I/O (empty content, wrong file type, bad id).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure (connect, timeout, interrupted body).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from a backend.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response body was not valid JSON or not the expected structure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed success body missing the field the operation needs.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Upload exceeds the client-side size limit.
    #[error("Payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Note not found on the backend.
    #[error("Note not found: {0}")]
    NotFound(NoteId),

    /// An upload is in flight; navigation and manual saves must wait.
    #[error("Please wait, a document is still being processed")]
    Busy,

    /// A save of the same draft has not returned yet.
    #[error("The note is still being saved")]
    SaveInFlight,

    /// The requested view action is not defined for the active view.
    #[error("Cannot {action} from the {from} view")]
    InvalidTransition { from: String, action: String },

    /// Operation requires session state that is not present.
    #[error("Invalid state: {0}")]
    State(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`] for callers that branch on failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationError,
    NetworkError,
    ServerError,
    ParseError,
    InvalidResponse,
    PayloadTooLarge,
    NotFound,
    Busy,
    StateError,
    ConfigError,
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ValidationError => "ValidationError",
            Self::NetworkError => "NetworkError",
            Self::ServerError => "ServerError",
            Self::ParseError => "ParseError",
            Self::InvalidResponse => "InvalidResponse",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::NotFound => "NotFound",
            Self::Busy => "Busy",
            Self::StateError => "StateError",
            Self::ConfigError => "ConfigError",
            Self::IoError => "IoError",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::ValidationError,
            Error::Network(_) => ErrorKind::NetworkError,
            Error::Server { .. } => ErrorKind::ServerError,
            Error::Parse(_) => ErrorKind::ParseError,
            Error::InvalidResponse(_) => ErrorKind::InvalidResponse,
            Error::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Busy | Error::SaveInFlight => ErrorKind::Busy,
            Error::InvalidTransition { .. } | Error::State(_) => ErrorKind::StateError,
            Error::Config(_) => ErrorKind::ConfigError,
            Error::Io(_) => ErrorKind::IoError,
        }
    }

    /// Whether a failed attempt against one endpoint may be retried against
    /// the next candidate in a fallback chain.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Server { .. } | Error::Parse(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Parse(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}
