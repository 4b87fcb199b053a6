//! Request shapes callers supply to the write surface.

use crate::{CardId, ColumnId};
use serde::{Deserialize, Serialize};

/// Move a card to `position` within `column_id` (which may be the card's
/// current column). Out-of-range positions are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCardRequest {
    /// The card to move.
    pub card_id: CardId,
    /// Target column; must belong to the card's current board.
    pub column_id: ColumnId,
    /// Target index in the target column.
    pub position: u32,
}

/// Move a column to `position` within its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveColumnRequest {
    /// The column to move.
    pub column_id: ColumnId,
    /// Target index among the board's columns.
    pub position: u32,
}
