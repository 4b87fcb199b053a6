//! Authorization seam.
//!
//! The store asks a single predicate before every board-scoped operation.
//! The default policy grants everything to the board owner and nothing to
//! anyone else; deployments with richer membership swap in their own
//! [`Authorizer`].

use crate::storage::BoardStorage;
use async_trait::async_trait;
use board_types::{BoardError, BoardId, UserId};
use std::sync::Arc;

/// What an actor is trying to do to a board's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the board or anything on it (also gates channel joins).
    View,
    /// Add a column or card.
    Create,
    /// Edit fields of the board, a column or a card.
    Update,
    /// Reorder or relocate a column or card.
    Move,
    /// Delete the board, a column or a card.
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Move => "move",
            Action::Delete => "delete",
        };
        write!(f, "{name}")
    }
}

/// Access-control predicate consulted before every board-scoped operation.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Whether `actor` may perform `action` on `board_id`.
    ///
    /// `Ok(false)` means denied; `Err` means the question itself could not
    /// be answered (e.g. storage failure).
    async fn can_act_on(
        &self,
        actor: UserId,
        action: Action,
        board_id: BoardId,
    ) -> Result<bool, BoardError>;
}

/// Owner-only policy: the board owner may do everything, nobody else may do
/// anything. A board that does not exist authorizes nothing.
pub struct OwnerAuthorizer {
    storage: Arc<dyn BoardStorage>,
}

impl OwnerAuthorizer {
    /// Build the policy over the given storage backend.
    pub fn new(storage: Arc<dyn BoardStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Authorizer for OwnerAuthorizer {
    async fn can_act_on(
        &self,
        actor: UserId,
        _action: Action,
        board_id: BoardId,
    ) -> Result<bool, BoardError> {
        let board = self.storage.load_board(board_id).await?;
        Ok(board.is_some_and(|b| b.owner_id == actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use board_types::Board;

    async fn setup() -> (Arc<SqliteStorage>, Board) {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let board = Board {
            id: BoardId::new(),
            name: "Sprint".to_string(),
            description: None,
            owner_id: UserId::new(),
        };
        storage.insert_board(&board).await.unwrap();
        (storage, board)
    }

    #[tokio::test]
    async fn owner_is_authorized_for_every_action() {
        let (storage, board) = setup().await;
        let auth = OwnerAuthorizer::new(storage);

        for action in [
            Action::View,
            Action::Create,
            Action::Update,
            Action::Move,
            Action::Delete,
        ] {
            assert!(auth
                .can_act_on(board.owner_id, action, board.id)
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn non_owner_is_denied() {
        let (storage, board) = setup().await;
        let auth = OwnerAuthorizer::new(storage);

        let stranger = UserId::new();
        assert!(!auth
            .can_act_on(stranger, Action::View, board.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unknown_board_authorizes_nothing() {
        let (storage, board) = setup().await;
        let auth = OwnerAuthorizer::new(storage);

        assert!(!auth
            .can_act_on(board.owner_id, Action::View, BoardId::new())
            .await
            .unwrap());
    }
}
