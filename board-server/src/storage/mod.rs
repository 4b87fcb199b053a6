//! Persistent storage for boards, columns and cards.
//!
//! The store issues multi-row position patches; implementations must apply
//! each patch together with the moved/deleted entity's own row change in a
//! single transaction, and re-check the contiguous-position invariant before
//! committing.

mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::StorageError;
use async_trait::async_trait;
use board_core::PositionUpdate;
use board_types::{Board, BoardId, BoardTree, Card, CardId, Column, ColumnId, UserId};

/// Trait for board storage backends.
///
/// Positions are supplied by the caller (computed by the position engine);
/// the backend's job is atomicity, not ordering policy.
#[async_trait]
pub trait BoardStorage: Send + Sync {
    /// Load a bare board.
    async fn load_board(&self, id: BoardId) -> Result<Option<Board>, StorageError>;

    /// Load a board with its ordered columns and their ordered cards.
    async fn load_board_tree(&self, id: BoardId) -> Result<Option<BoardTree>, StorageError>;

    /// All boards owned by a user, newest first.
    async fn boards_for_owner(&self, owner: UserId) -> Result<Vec<Board>, StorageError>;

    /// Load a single column.
    async fn load_column(&self, id: ColumnId) -> Result<Option<Column>, StorageError>;

    /// Load a single card.
    async fn load_card(&self, id: CardId) -> Result<Option<Card>, StorageError>;

    /// A board's columns ordered by position.
    async fn list_columns(&self, board: BoardId) -> Result<Vec<Column>, StorageError>;

    /// A column's cards ordered by position.
    async fn list_cards(&self, column: ColumnId) -> Result<Vec<Card>, StorageError>;

    /// Resolve the board owning a column without loading the object graph.
    async fn board_id_of_column(&self, column: ColumnId)
        -> Result<Option<BoardId>, StorageError>;

    /// Persist a new board.
    async fn insert_board(&self, board: &Board) -> Result<(), StorageError>;

    /// Persist a new column (position already computed for append).
    async fn insert_column(&self, column: &Column) -> Result<(), StorageError>;

    /// Persist a new card (position already computed for append).
    async fn insert_card(&self, card: &Card) -> Result<(), StorageError>;

    /// Replace a board's mutable fields.
    async fn update_board(&self, board: &Board) -> Result<(), StorageError>;

    /// Replace a column's mutable fields (not position).
    async fn update_column(&self, column: &Column) -> Result<(), StorageError>;

    /// Replace a card's mutable fields (not position or column).
    async fn update_card(&self, card: &Card) -> Result<(), StorageError>;

    /// Delete a board and, transitively, all its columns and cards.
    async fn delete_board(&self, id: BoardId) -> Result<(), StorageError>;

    /// Delete a column and all its cards, applying the sibling compaction
    /// patch in the same transaction.
    async fn delete_column(
        &self,
        id: ColumnId,
        board_id: BoardId,
        sibling_patch: &[PositionUpdate<ColumnId>],
    ) -> Result<(), StorageError>;

    /// Delete a card, applying the sibling compaction patch in the same
    /// transaction.
    async fn delete_card(
        &self,
        id: CardId,
        column_id: ColumnId,
        sibling_patch: &[PositionUpdate<CardId>],
    ) -> Result<(), StorageError>;

    /// Move a card: apply both patch sets, then reassign the card's column
    /// and position as one atomic unit. `from_column` and `to_column` are
    /// equal for a same-column reorder.
    #[allow(clippy::too_many_arguments)]
    async fn move_card(
        &self,
        id: CardId,
        from_column: ColumnId,
        to_column: ColumnId,
        new_position: u32,
        source_patch: &[PositionUpdate<CardId>],
        target_patch: &[PositionUpdate<CardId>],
    ) -> Result<(), StorageError>;

    /// Move a column within its board.
    async fn move_column(
        &self,
        id: ColumnId,
        board_id: BoardId,
        new_position: u32,
        sibling_patch: &[PositionUpdate<ColumnId>],
    ) -> Result<(), StorageError>;
}
