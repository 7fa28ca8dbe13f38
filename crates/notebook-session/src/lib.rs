//! # notebook-session
//!
//! Client-side session state for the notebook: which view is visible, the
//! note being edited, the cached note list and the upload protocol.
//!
//! [`SessionController`] is the entry point. It is driven by a front end
//! (the CLI, or any UI) and reports outcomes on an [`EventBus`].

pub mod cache;
pub mod config;
pub mod controller;
pub mod draft;
pub mod events;
pub mod local_state;
pub mod upload;
pub mod view;

pub use cache::NoteCollectionCache;
pub use config::SessionConfig;
pub use controller::{ArtifactKind, SessionController};
pub use draft::{Draft, DraftField, DraftSession};
pub use events::{EventBus, Notification, NotificationLevel, SessionEvent};
pub use local_state::{LocalState, LocalStateStore, RecoveryMarker, Theme};
pub use upload::{BusyFlag, GraceFlag, UploadCoordinator, UploadOutcome, UploadPhase, UploadTimings};
pub use view::{NavItem, Transition, View, ViewAction, ViewCoordinator, ViewSnapshot};
