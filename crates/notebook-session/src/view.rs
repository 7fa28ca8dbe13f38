//! View coordinator: which of the three views is visible.
//!
//! A pure state machine. Guards that depend on session state (busy flag,
//! grace flag) are evaluated by the controller before a resolved target
//! is entered.

use std::fmt;

use notebook_core::{Error, Result};
use serde::Serialize;

/// The three mutually exclusive views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    List,
    Editor,
    Detail,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Editor => write!(f, "editor"),
            Self::Detail => write!(f, "detail"),
        }
    }
}

/// Navigation entry highlighted for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavItem {
    AllNotes,
    NewNote,
}

/// User actions that request a view change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewAction {
    ShowList,
    NewNote,
    EditNote,
    ViewNote,
    Back,
    Cancel,
    SaveAndLeave,
    DeleteViewed,
    Resume,
}

impl fmt::Display for ViewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ShowList => "show the note list",
            Self::NewNote => "create a note",
            Self::EditNote => "edit a note",
            Self::ViewNote => "view a note",
            Self::Back => "go back",
            Self::Cancel => "cancel editing",
            Self::SaveAndLeave => "save",
            Self::DeleteViewed => "delete the viewed note",
            Self::Resume => "resume the last created note",
        };
        f.write_str(name)
    }
}

/// Visibility of every view plus navigation highlighting.
///
/// Exactly one of the `*_visible` flags is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub active: View,
    pub list_visible: bool,
    pub editor_visible: bool,
    pub detail_visible: bool,
    pub highlighted: NavItem,
}

impl ViewSnapshot {
    pub fn of(active: View) -> Self {
        Self {
            active,
            list_visible: active == View::List,
            editor_visible: active == View::Editor,
            detail_visible: active == View::Detail,
            highlighted: match active {
                View::Editor => NavItem::NewNote,
                View::List | View::Detail => NavItem::AllNotes,
            },
        }
    }

    pub fn visible_count(&self) -> usize {
        [self.list_visible, self.editor_visible, self.detail_visible]
            .iter()
            .filter(|v| **v)
            .count()
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The target view was entered.
    Entered(View),
    /// A stay condition kept the current view.
    Stayed(View),
    /// The request was refused (busy); the view did not change.
    Rejected { view: View, reason: String },
}

impl Transition {
    /// The view active after the request settled.
    pub fn view(&self) -> View {
        match self {
            Self::Entered(v) | Self::Stayed(v) => *v,
            Self::Rejected { view, .. } => *view,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Owns the active view. Initial state is [`View::List`].
#[derive(Debug, Clone)]
pub struct ViewCoordinator {
    active: View,
}

impl Default for ViewCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCoordinator {
    pub fn new() -> Self {
        Self { active: View::List }
    }

    pub fn active(&self) -> View {
        self.active
    }

    /// Target view for `action` from the active view.
    pub fn resolve(&self, action: ViewAction) -> Result<View> {
        use View::*;
        use ViewAction::*;

        let target = match (self.active, action) {
            (_, ShowList) => Some(List),
            (List | Detail, NewNote) => Some(Editor),
            (List | Detail, EditNote) => Some(Editor),
            (List, ViewNote) => Some(Detail),
            (Detail, Back) => Some(List),
            (Detail, DeleteViewed) => Some(List),
            (Editor, Cancel) => Some(List),
            (Editor, SaveAndLeave) => Some(List),
            (List, Resume) => Some(Editor),
            _ => None,
        };

        target.ok_or_else(|| Error::InvalidTransition {
            from: self.active.to_string(),
            action: action.to_string(),
        })
    }

    /// Make `view` the only visible view.
    pub fn enter(&mut self, view: View) -> ViewSnapshot {
        tracing::debug!(from = %self.active, to = %view, "Entering view");
        self.active = view;
        ViewSnapshot::of(view)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot::of(self.active)
    }
}
