//! Error taxonomy for boardsync operations.

use crate::{BoardId, CardId};
use thiserror::Error;

/// Which kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A board.
    Board,
    /// A column.
    Column,
    /// A card.
    Card,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Board => write!(f, "board"),
            EntityKind::Column => write!(f, "column"),
            EntityKind::Card => write!(f, "card"),
        }
    }
}

/// Errors surfaced by board operations.
///
/// `NotFound`, `Forbidden` and `CrossParentViolation` are expected,
/// user-facing outcomes returned synchronously to the request.
/// `InvariantViolation` means the write transaction was aborted and should
/// reach an operator, not a retry loop.
#[derive(Debug, Error)]
pub enum BoardError {
    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Which entity kind the lookup failed for.
        kind: EntityKind,
        /// Display form of the missing id.
        id: String,
    },

    /// The authorization predicate denied the action.
    #[error("forbidden: {action} on board {board_id}")]
    Forbidden {
        /// The denied action, e.g. "move".
        action: String,
        /// The board the action targeted.
        board_id: BoardId,
    },

    /// A card move targeted a column on a different board.
    #[error("card {card_id} cannot move to a column on board {target_board_id}")]
    CrossParentViolation {
        /// The card being moved.
        card_id: CardId,
        /// The board owning the target column.
        target_board_id: BoardId,
    },

    /// A sibling list failed the contiguous-position check.
    ///
    /// Indicates an engine bug or storage corruption; the enclosing
    /// transaction was rolled back.
    #[error("position invariant violated: {detail}")]
    InvariantViolation {
        /// What failed the check.
        detail: String,
    },

    /// Storage or other infrastructure failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BoardError {
    /// Build a `NotFound` from any displayable id.
    pub fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for the expected, user-facing outcomes (not operator-facing).
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Forbidden { .. } | Self::CrossParentViolation { .. }
        )
    }
}

/// Result alias for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let id = CardId::new();
        let err = BoardError::not_found(EntityKind::Card, id);
        assert_eq!(err.to_string(), format!("card not found: {id}"));
    }

    #[test]
    fn user_facing_classification() {
        assert!(BoardError::not_found(EntityKind::Board, "x").is_user_facing());
        assert!(BoardError::Forbidden {
            action: "move".into(),
            board_id: BoardId::new(),
        }
        .is_user_facing());
        assert!(!BoardError::InvariantViolation {
            detail: "gap at 2".into(),
        }
        .is_user_facing());
        assert!(!BoardError::Internal("db down".into()).is_user_facing());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoardError>();
    }
}
