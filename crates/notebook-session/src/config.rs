//! Session timing configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use notebook_core::defaults;
use tracing::warn;

/// Guards and windows used by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a save keeps the editor open after an auto-persist.
    pub grace_period: Duration,
    /// How long the busy flag stays raised after an auto-persist.
    pub busy_release_delay: Duration,
    /// Maximum age of a recovery marker honored on resume.
    pub recovery_window: chrono::Duration,
    /// Largest document accepted for upload.
    pub max_upload_bytes: u64,
    /// JSON file holding the recovery marker and theme; `None` keeps them in memory.
    pub state_path: Option<PathBuf>,
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_millis(defaults::GRACE_PERIOD_MS),
            busy_release_delay: Duration::from_millis(defaults::BUSY_RELEASE_DELAY_MS),
            recovery_window: chrono::Duration::seconds(defaults::RECOVERY_WINDOW_SECS),
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            state_path: None,
            event_capacity: defaults::EVENT_BUS_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Default state file, e.g. ~/.local/share/notebook/state.json
    pub fn default_state_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|mut p| {
            p.push("notebook");
            p.push("state.json");
            p
        })
    }

    /// Load from NOTEBOOK_* environment variables over defaults.
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|name| env::var(name).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_u64(&lookup, defaults::ENV_GRACE_PERIOD_MS) {
            self.grace_period = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, defaults::ENV_BUSY_RELEASE_DELAY_MS) {
            self.busy_release_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, defaults::ENV_RECOVERY_WINDOW_SECS) {
            match i64::try_from(secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
            {
                Some(window) => self.recovery_window = window,
                None => warn!(
                    var = defaults::ENV_RECOVERY_WINDOW_SECS,
                    value = secs,
                    "Ignoring out-of-range environment override"
                ),
            }
        }
        if let Some(bytes) = parse_u64(&lookup, defaults::ENV_MAX_UPLOAD_BYTES) {
            self.max_upload_bytes = bytes;
        }
        if let Some(path) = lookup(defaults::ENV_STATE_PATH) {
            self.state_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }
}

fn parse_u64<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring non-numeric environment override");
            None
        }
    }
}
