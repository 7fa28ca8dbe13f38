//! Structured logging field name constants.
//!
//! Span fields declared `Empty` in `#[instrument]` are filled in later with
//! `Span::current().record(..)` using these constants. Field lists inside the
//! tracing macros must be identifiers, so they spell the same names inline.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded session, the user cannot proceed without retrying |
//! | WARN  | Recoverable issue, fallback applied or request rejected |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, transitions, intermediate values |
//! | TRACE | Per-item iteration (notes in a list, quiz entries) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "ai", "session", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "http_store", "http_ai", "view", "upload", "cache"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "list", "create", "summarize", "extract_text"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// Draft session id.
pub const SESSION_ID: &str = "session_id";

/// Active view name.
pub const VIEW: &str = "view";

/// Endpoint path a request was sent to.
pub const ENDPOINT: &str = "endpoint";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of notes returned by a list call.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of an uploaded payload.
pub const PAYLOAD_BYTES: &str = "payload_bytes";

/// Byte length of a text input sent to the AI service.
pub const INPUT_LEN: &str = "input_len";

/// Byte length of a response body.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// HTTP status code.
pub const STATUS: &str = "status";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
