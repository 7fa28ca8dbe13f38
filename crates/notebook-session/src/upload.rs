//! Upload coordination: extraction, draft population and auto-persist.
//!
//! ```text
//! Idle -> Submitted -> Extracted -> Persisting -> Persisted
//!             |                          |
//!             +-> Failed                 +-> PersistFailed
//! ```
//!
//! The busy flag is raised from submission until persistence settles, and
//! for a short guard delay after a successful persist. While it is raised,
//! navigation and manual saves are refused.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use notebook_core::{logging, validate_upload, AiService, Error, NoteId, UploadFile};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, field, info, instrument, warn, Span};

use crate::draft::DraftSession;
use crate::events::{EventBus, NotificationLevel, SessionEvent};
use crate::local_state::LocalStateStore;

/// Phase of the current upload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    Submitted,
    Extracted,
    Persisting,
    Persisted,
    Failed,
    PersistFailed,
}

/// How a completed upload run ended.
#[derive(Debug)]
pub enum UploadOutcome {
    /// Another upload was in flight.
    Rejected,
    /// Validation or extraction failed; the draft is untouched.
    Failed(Error),
    /// Extraction succeeded but the save failed; the draft keeps the text.
    PersistFailed(Error),
    /// The note was saved; the editor stays on it.
    Persisted { note_id: NoteId },
}

impl UploadOutcome {
    pub fn phase(&self) -> UploadPhase {
        match self {
            Self::Rejected => UploadPhase::Idle,
            Self::Failed(_) => UploadPhase::Failed,
            Self::PersistFailed(_) => UploadPhase::PersistFailed,
            Self::Persisted { .. } => UploadPhase::Persisted,
        }
    }
}

// =============================================================================
// GUARDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusyState {
    Idle,
    Held,
    Releasing { until: Instant },
}

/// Process-wide busy flag.
///
/// Evaluated at the moment a transition is requested, so a delayed release
/// needs no timer: the flag simply reads false once the deadline passes.
#[derive(Debug)]
pub struct BusyFlag {
    state: Mutex<BusyState>,
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self {
            state: Mutex::new(BusyState::Idle),
        }
    }
}

impl BusyFlag {
    fn state(&self) -> MutexGuard<'_, BusyState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_busy(&self) -> bool {
        match *self.state() {
            BusyState::Idle => false,
            BusyState::Held => true,
            BusyState::Releasing { until } => Instant::now() < until,
        }
    }

    /// Raise the flag unless it is already raised.
    pub fn try_hold(&self) -> bool {
        let mut state = self.state();
        let busy = match *state {
            BusyState::Idle => false,
            BusyState::Held => true,
            BusyState::Releasing { until } => Instant::now() < until,
        };
        if !busy {
            *state = BusyState::Held;
        }
        !busy
    }

    pub fn release_now(&self) {
        *self.state() = BusyState::Idle;
    }

    pub fn release_after(&self, delay: Duration) {
        *self.state() = BusyState::Releasing {
            until: Instant::now() + delay,
        };
    }
}

/// Short-lived "stay in the editor" flag armed after an auto-persist.
#[derive(Debug, Default)]
pub struct GraceFlag {
    until: Mutex<Option<Instant>>,
}

impl GraceFlag {
    fn until(&self) -> MutexGuard<'_, Option<Instant>> {
        self.until.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn arm(&self, period: Duration) {
        *self.until() = Some(Instant::now() + period);
    }

    pub fn is_active(&self) -> bool {
        let until = *self.until();
        until.is_some_and(|until| Instant::now() < until)
    }

    pub fn clear(&self) {
        *self.until() = None;
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Timings and limits for the upload protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTimings {
    pub grace_period: Duration,
    pub busy_release_delay: Duration,
    pub max_upload_bytes: u64,
}

/// Runs upload tasks against the AI service and the draft session.
pub struct UploadCoordinator {
    ai: Arc<dyn AiService>,
    local: Arc<LocalStateStore>,
    events: EventBus,
    timings: UploadTimings,
    busy: BusyFlag,
    grace: GraceFlag,
    phase: Mutex<UploadPhase>,
}

impl UploadCoordinator {
    pub fn new(
        ai: Arc<dyn AiService>,
        local: Arc<LocalStateStore>,
        events: EventBus,
        timings: UploadTimings,
    ) -> Self {
        Self {
            ai,
            local,
            events,
            timings,
            busy: BusyFlag::default(),
            grace: GraceFlag::default(),
            phase: Mutex::new(UploadPhase::Idle),
        }
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    pub fn grace(&self) -> &GraceFlag {
        &self.grace
    }

    pub fn phase(&self) -> UploadPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: UploadPhase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
        debug!(?phase, "Upload phase changed");
        self.events.emit(SessionEvent::UploadPhaseChanged { phase });
    }

    /// Reset guards on leaving the editor.
    pub fn reset(&self) {
        self.busy.release_now();
        self.grace.clear();
    }

    /// Run one upload task to completion.
    ///
    /// Extraction always settles before persistence is attempted. The task
    /// is discarded at the end and the phase returns to `Idle`.
    #[instrument(skip(self, file, draft), fields(subsystem = "session", component = "upload", op = "run", payload_bytes = file.size(), note_id = field::Empty))]
    pub async fn run(&self, file: UploadFile, draft: &DraftSession) -> UploadOutcome {
        if self.busy.is_busy() {
            self.events
                .notify(NotificationLevel::Warning, Error::Busy.to_string());
            return UploadOutcome::Rejected;
        }

        let outcome = self.run_task(file, draft).await;
        self.set_phase(UploadPhase::Idle);
        outcome
    }

    async fn run_task(&self, file: UploadFile, draft: &DraftSession) -> UploadOutcome {
        self.set_phase(UploadPhase::Submitted);

        if let Err(e) = validate_upload(&file, self.timings.max_upload_bytes) {
            return self.fail(e);
        }
        if !self.busy.try_hold() {
            self.events
                .notify(NotificationLevel::Warning, Error::Busy.to_string());
            return UploadOutcome::Rejected;
        }
        self.events.notify(
            NotificationLevel::Info,
            format!("Processing {}...", file.file_name),
        );

        let extraction = match self.ai.extract_text(&file).await {
            Ok(x) if x.text.trim().is_empty() => {
                self.busy.release_now();
                return self.fail(Error::InvalidResponse(
                    "No text extracted from document".to_string(),
                ));
            }
            Ok(x) => x,
            Err(e) => {
                self.busy.release_now();
                return self.fail(e);
            }
        };

        if let Err(e) = draft.apply_extraction(&extraction) {
            self.busy.release_now();
            return self.fail(e);
        }
        self.set_phase(UploadPhase::Extracted);
        let pages = extraction
            .page_count
            .map(|p| p.to_string())
            .unwrap_or_else(|| "an unknown number of".to_string());
        self.events.notify(
            NotificationLevel::Success,
            format!(
                "Document processed using {}. Extracted {} characters from {} page(s).",
                extraction.endpoint,
                extraction.text.chars().count(),
                pages
            ),
        );

        self.set_phase(UploadPhase::Persisting);
        let saved = draft.save().await.and_then(|note| {
            note.id
                .ok_or_else(|| Error::InvalidResponse("saved note has no id".to_string()))
        });
        match saved {
            Ok(note_id) => {
                self.grace.arm(self.timings.grace_period);
                self.local.record_recovery(note_id);
                self.busy.release_after(self.timings.busy_release_delay);
                self.set_phase(UploadPhase::Persisted);
                Span::current().record(logging::NOTE_ID, field::display(note_id));
                info!("Uploaded document saved as note");
                self.events
                    .notify(NotificationLevel::Success, "Note saved successfully!");
                UploadOutcome::Persisted { note_id }
            }
            Err(e) => {
                self.busy.release_now();
                self.set_phase(UploadPhase::PersistFailed);
                warn!(error = %e, "Auto-save after extraction failed");
                self.events.notify(
                    NotificationLevel::Error,
                    format!("Error saving note: {}", e),
                );
                UploadOutcome::PersistFailed(e)
            }
        }
    }

    fn fail(&self, error: Error) -> UploadOutcome {
        self.set_phase(UploadPhase::Failed);
        warn!(error = %error, "Upload failed");
        self.events.notify(
            NotificationLevel::Error,
            format!("Error processing document: {}", error),
        );
        UploadOutcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_busy_release_after_delay() {
        let busy = BusyFlag::default();
        assert!(busy.try_hold());
        assert!(busy.is_busy());
        assert!(!busy.try_hold());

        busy.release_after(Duration::from_secs(2));
        assert!(busy.is_busy());
        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(busy.is_busy());
        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(!busy.is_busy());
        assert!(busy.try_hold());
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_expires() {
        let grace = GraceFlag::default();
        assert!(!grace.is_active());
        grace.arm(Duration::from_secs(3));
        assert!(grace.is_active());
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!grace.is_active());
    }

    #[test]
    fn test_grace_clear() {
        let grace = GraceFlag::default();
        grace.arm(Duration::from_secs(60));
        grace.clear();
        assert!(!grace.is_active());
    }

    #[test]
    fn test_outcome_phase() {
        assert_eq!(UploadOutcome::Rejected.phase(), UploadPhase::Idle);
        assert_eq!(
            UploadOutcome::Failed(Error::Busy).phase(),
            UploadPhase::Failed
        );
    }
}
