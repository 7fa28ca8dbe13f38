//! Client-side persisted state: the recovery marker and the theme.
//!
//! Held in memory and flushed to a JSON file after every change. Persistence
//! is best effort: a failed write is logged and the in-memory value stays
//! authoritative for the rest of the process.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use notebook_core::{Error, NoteId, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Display theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(Error::Validation(format!("unknown theme: {}", other))),
        }
    }
}

/// The note most recently created by an upload, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMarker {
    pub note_id: NoteId,
    pub created_at: DateTime<Utc>,
}

impl RecoveryMarker {
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age >= Duration::zero() && age <= window
    }
}

/// Persisted state shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryMarker>,
    #[serde(default)]
    pub theme: Theme,
}

/// Thread-safe holder of [`LocalState`], optionally backed by a file.
#[derive(Debug)]
pub struct LocalStateStore {
    path: Option<PathBuf>,
    state: Mutex<LocalState>,
}

impl LocalStateStore {
    /// State that lives only for this process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(LocalState::default()),
        }
    }

    /// Load state from `path`. A missing or unreadable file starts from defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<LocalState>(&content) {
                Ok(state) => {
                    debug!(path = %path.display(), "Loaded local state");
                    state
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse local state, using defaults");
                    LocalState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No local state file, using defaults");
                LocalState::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read local state, using defaults");
                LocalState::default()
            }
        };
        Self {
            path: Some(path),
            state: Mutex::new(state),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn state(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> LocalState {
        self.state().clone()
    }

    fn update(&self, f: impl FnOnce(&mut LocalState)) {
        let snapshot = {
            let mut state = self.state();
            f(&mut state);
            state.clone()
        };
        if let Err(e) = self.persist(&snapshot) {
            warn!(error = %e, "Failed to persist local state");
        }
    }

    fn persist(&self, state: &LocalState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    // ─── Recovery marker ──────────────────────────────────────────────────

    pub fn record_recovery(&self, note_id: NoteId) {
        self.record_recovery_at(note_id, Utc::now());
    }

    pub fn record_recovery_at(&self, note_id: NoteId, created_at: DateTime<Utc>) {
        info!(note_id = %note_id, "Recorded recovery marker");
        self.update(|s| {
            s.recovery = Some(RecoveryMarker {
                note_id,
                created_at,
            })
        });
    }

    pub fn recovery(&self) -> Option<RecoveryMarker> {
        self.state().recovery
    }

    /// Consume the marker. Returns its note id only if it is within
    /// `window`; a stale marker is cleared as well.
    pub fn take_fresh_recovery(&self, window: Duration) -> Option<NoteId> {
        self.take_fresh_recovery_at(Utc::now(), window)
    }

    pub fn take_fresh_recovery_at(&self, now: DateTime<Utc>, window: Duration) -> Option<NoteId> {
        let marker = self.recovery()?;
        self.clear_recovery();
        if marker.is_fresh(now, window) {
            Some(marker.note_id)
        } else {
            debug!(note_id = %marker.note_id, "Ignoring stale recovery marker");
            None
        }
    }

    pub fn clear_recovery(&self) {
        if self.recovery().is_some() {
            self.update(|s| s.recovery = None);
        }
    }

    // ─── Theme ────────────────────────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.state().theme
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update(|s| s.theme = theme);
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = self.theme().toggle();
        self.set_theme(theme);
        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i64) -> NoteId {
        NoteId::new(raw).unwrap()
    }

    #[test]
    fn test_theme_toggle_and_parse() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_fresh_marker_is_consumed_once() {
        let store = LocalStateStore::in_memory();
        let t0 = Utc::now();
        store.record_recovery_at(id(5), t0);

        let taken = store.take_fresh_recovery_at(t0 + Duration::seconds(30), Duration::seconds(60));
        assert_eq!(taken, Some(id(5)));
        assert!(store.recovery().is_none());
        assert_eq!(
            store.take_fresh_recovery_at(t0 + Duration::seconds(31), Duration::seconds(60)),
            None
        );
    }

    #[test]
    fn test_stale_marker_is_cleared() {
        let store = LocalStateStore::in_memory();
        let t0 = Utc::now();
        store.record_recovery_at(id(5), t0);

        let taken = store.take_fresh_recovery_at(t0 + Duration::seconds(61), Duration::seconds(60));
        assert_eq!(taken, None);
        assert!(store.recovery().is_none());
    }

    #[test]
    fn test_marker_from_the_future_is_not_fresh() {
        let t0 = Utc::now();
        let marker = RecoveryMarker {
            note_id: id(1),
            created_at: t0 + Duration::seconds(10),
        };
        assert!(!marker.is_fresh(t0, Duration::seconds(60)));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = LocalStateStore::open(&path);
        assert_eq!(store.theme(), Theme::Light);
        store.set_theme(Theme::Dark);
        store.record_recovery(id(9));

        let reopened = LocalStateStore::open(&path);
        assert_eq!(reopened.theme(), Theme::Dark);
        assert_eq!(reopened.recovery().map(|m| m.note_id), Some(id(9)));
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{broken").unwrap();

        let store = LocalStateStore::open(&path);
        assert_eq!(store.snapshot(), LocalState::default());
    }
}
