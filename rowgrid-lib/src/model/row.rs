//! Grid row

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::RowContent;

/// Stable row identity, fixed for the row's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
    /// Creates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived classification of a row. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowState {
    /// All cells blank, not the last row.
    Empty,
    /// At least one cell and no blank cell.
    Filled,
    /// Some cells blank, some not.
    Partial,
    /// All cells blank and positioned last.
    LastEmpty,
}

impl RowState {
    /// Returns `true` for `Empty` and `LastEmpty`.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty | Self::LastEmpty)
    }
}

/// A single row of the grid.
///
/// `index` is always the row's current position in the ledger. `row_number`
/// is the 1-based display number maintained by the sequencer; `0` means the
/// row has not been numbered yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub(crate) id: RowId,
    pub(crate) index: usize,
    pub(crate) row_number: u64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) modified_at: DateTime<Utc>,
    pub(crate) content: RowContent,
    pub(crate) checked: bool,
    pub(crate) visible: bool,
    pub(crate) validation_message: Option<String>,
}

impl Row {
    /// Creates an unnumbered, visible row at `index`.
    pub(crate) fn new(index: usize, content: RowContent, now: DateTime<Utc>) -> Self {
        Self {
            id: RowId::new(),
            index,
            row_number: 0,
            created_at: now,
            modified_at: now,
            content,
            checked: false,
            visible: true,
            validation_message: None,
        }
    }

    /// Returns the stable id.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Returns the 0-based position in the ledger.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the display number (`0` if unassigned).
    pub fn row_number(&self) -> u64 {
        self.row_number
    }

    /// Returns when the row was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the row was last modified.
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Returns the row content.
    pub fn content(&self) -> &RowContent {
        &self.content
    }

    /// Returns the checked flag.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Returns the visibility flag.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the validation message, if any.
    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    /// Returns `true` if every cell is blank.
    pub fn is_empty(&self) -> bool {
        self.content.is_blank()
    }

    /// Classifies the row given the ledger's row count.
    pub fn state(&self, row_count: usize) -> RowState {
        if self.content.is_blank() {
            if self.index + 1 == row_count {
                RowState::LastEmpty
            } else {
                RowState::Empty
            }
        } else if self.content.is_filled() {
            RowState::Filled
        } else {
            RowState::Partial
        }
    }

    /// Copies the user payload: content, checked flag and validation message.
    pub(crate) fn payload(&self) -> RowPayload {
        RowPayload {
            content: self.content.clone(),
            checked: self.checked,
            validation_message: self.validation_message.clone(),
        }
    }

    /// Installs a payload and stamps `modified_at`.
    pub(crate) fn put_payload(&mut self, payload: RowPayload, now: DateTime<Utc>) {
        self.content = payload.content;
        self.checked = payload.checked;
        self.validation_message = payload.validation_message;
        self.modified_at = now;
    }
}

/// The part of a row that moves when rows shift at the floor.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RowPayload {
    pub(crate) content: RowContent,
    pub(crate) checked: bool,
    pub(crate) validation_message: Option<String>,
}
