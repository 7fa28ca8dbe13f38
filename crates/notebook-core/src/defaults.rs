//! Centralized default constants for the notebook client.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// BACKEND
// =============================================================================

/// Default base URL for the notes backend and the AI service.
pub const BASE_URL: &str = "http://localhost:8000";

/// Notes collection path.
pub const NOTES_PATH: &str = "/api/notes";

/// Summarization endpoint.
pub const SUMMARIZE_PATH: &str = "/api/summarize";

/// Quiz generation endpoint.
pub const QUIZ_PATH: &str = "/api/generate-quiz";

/// Mind map generation endpoint.
pub const MINDMAP_PATH: &str = "/api/mindmap";

/// Primary text extraction endpoint (PDF parser).
pub const EXTRACT_PRIMARY_PATH: &str = "/api/upload-pdf";

/// Fallback text extraction endpoint (handwriting/OCR).
pub const EXTRACT_FALLBACK_PATH: &str = "/api/handwriting";

/// Backend status endpoint.
pub const STATUS_PATH: &str = "/api/status";

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Timeout for CRUD and generation requests (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound for a single extraction attempt (seconds).
pub const EXTRACT_TIMEOUT_SECS: u64 = 120;

/// Timeout for the status probe (seconds).
pub const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Requests slower than this are logged with `slow = true`.
pub const SLOW_REQUEST_MS: u64 = 10_000;

// =============================================================================
// UPLOAD
// =============================================================================

/// Maximum accepted upload size: 50 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Multipart field name carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// SESSION
// =============================================================================

/// How long the busy flag stays raised after an auto-persist completes (ms).
pub const BUSY_RELEASE_DELAY_MS: u64 = 2_000;

/// How long a save keeps the editor open after an auto-persist (ms).
pub const GRACE_PERIOD_MS: u64 = 3_000;

/// A recovery marker older than this is ignored on startup (seconds).
pub const RECOVERY_WINDOW_SECS: i64 = 60;

/// Title applied to notes saved with a blank title.
pub const UNTITLED_NOTE: &str = "Untitled Note";

/// Capacity of the session event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Characters of summary/content shown per note in list view.
pub const PREVIEW_LENGTH: usize = 100;

/// Placeholder rendered for a mind map branch without subtopics.
pub const NO_SUBTOPICS_PLACEHOLDER: &str = "(No subtopics)";

// =============================================================================
// ENVIRONMENT
// =============================================================================

pub const ENV_API_URL: &str = "NOTEBOOK_API_URL";
pub const ENV_AI_URL: &str = "NOTEBOOK_AI_URL";
pub const ENV_EXTRACT_URL: &str = "NOTEBOOK_EXTRACT_URL";
pub const ENV_TIMEOUT_SECS: &str = "NOTEBOOK_TIMEOUT_SECS";
pub const ENV_EXTRACT_TIMEOUT_SECS: &str = "NOTEBOOK_EXTRACT_TIMEOUT_SECS";
pub const ENV_MAX_UPLOAD_BYTES: &str = "NOTEBOOK_MAX_UPLOAD_BYTES";
pub const ENV_GRACE_PERIOD_MS: &str = "NOTEBOOK_GRACE_PERIOD_MS";
pub const ENV_BUSY_RELEASE_DELAY_MS: &str = "NOTEBOOK_BUSY_RELEASE_DELAY_MS";
pub const ENV_RECOVERY_WINDOW_SECS: &str = "NOTEBOOK_RECOVERY_WINDOW_SECS";
pub const ENV_STATE_PATH: &str = "NOTEBOOK_STATE_PATH";
