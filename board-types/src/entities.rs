//! Domain entities: boards own ordered columns, columns own ordered cards.
//!
//! `position` is a dense, zero-based rank among siblings under the same
//! parent. After any completed operation the positions within one parent
//! form exactly `{0, ..., n-1}`.

use crate::{BoardId, CardId, ColumnId, UserId};
use serde::{Deserialize, Serialize};

/// A board: the top-level container, exclusively owned by its creating user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Unique identifier.
    pub id: BoardId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// The user that created and owns this board.
    pub owner_id: UserId,
}

/// A column on a board, exclusively owned by that board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Unique identifier.
    pub id: ColumnId,
    /// The owning board.
    pub board_id: BoardId,
    /// Display name.
    pub name: String,
    /// Dense zero-based rank among the board's columns.
    pub position: u32,
}

/// A card in a column. The column reference is reassignable on move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier.
    pub id: CardId,
    /// The owning column.
    pub column_id: ColumnId,
    /// Card title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Dense zero-based rank among the column's cards.
    pub position: u32,
    /// Optional assignee (non-owning reference).
    pub assignee_id: Option<UserId>,
}

/// A column together with its ordered cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTree {
    /// The column itself.
    pub column: Column,
    /// Cards ordered by position.
    pub cards: Vec<Card>,
}

/// A board together with its ordered columns and their ordered cards.
///
/// This is the expanded shape clients render; it is read far more often than
/// the bare entity and is cached under its own key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTree {
    /// The board itself.
    pub board: Board,
    /// Columns ordered by position, each with its ordered cards.
    pub columns: Vec<ColumnTree>,
}

impl BoardTree {
    /// Total number of cards across all columns.
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }
}
