//! Tagged partial-update fields.
//!
//! A patch field is one of three states: leave the stored value alone, set a
//! new value, or clear an optional value. This removes the ambiguity of
//! "absent vs. present-but-null" that an `Option<Option<T>>` encoding has.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// One field of a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldUpdate<T> {
    /// Don't touch the stored value.
    #[default]
    Unchanged,
    /// Replace the stored value.
    Set(T),
    /// Clear the stored value (only meaningful for optional fields).
    Clear,
}

impl<T> FieldUpdate<T> {
    /// True unless this field is `Unchanged`.
    pub fn is_change(&self) -> bool {
        !matches!(self, FieldUpdate::Unchanged)
    }

    /// Resolve this update against the current required value.
    ///
    /// `Clear` is not meaningful for required fields and resolves to the
    /// current value.
    pub fn apply(self, current: T) -> T {
        match self {
            FieldUpdate::Set(value) => value,
            FieldUpdate::Unchanged | FieldUpdate::Clear => current,
        }
    }

    /// Resolve this update against the current optional value.
    pub fn apply_opt(self, current: Option<T>) -> Option<T> {
        match self {
            FieldUpdate::Unchanged => current,
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Clear => None,
        }
    }
}

/// Partial update for a board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPatch {
    /// New name, if any.
    pub name: FieldUpdate<String>,
    /// New description, if any.
    pub description: FieldUpdate<String>,
}

impl BoardPatch {
    /// True if any field changes.
    pub fn is_change(&self) -> bool {
        self.name.is_change() || self.description.is_change()
    }
}

/// Partial update for a column. Position changes go through move
/// operations, never through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPatch {
    /// New name, if any.
    pub name: FieldUpdate<String>,
}

impl ColumnPatch {
    /// True if any field changes.
    pub fn is_change(&self) -> bool {
        self.name.is_change()
    }
}

/// Partial update for a card. Column and position changes go through move
/// operations, never through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPatch {
    /// New title, if any.
    pub title: FieldUpdate<String>,
    /// New description, if any.
    pub description: FieldUpdate<String>,
    /// New assignee, if any.
    pub assignee_id: FieldUpdate<UserId>,
}

impl CardPatch {
    /// True if any field changes.
    pub fn is_change(&self) -> bool {
        self.title.is_change() || self.description.is_change() || self.assignee_id.is_change()
    }
}
