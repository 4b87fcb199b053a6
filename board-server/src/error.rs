//! Error types for board-server.

use board_types::BoardError;

/// Umbrella error for server setup and background tasks.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded into a domain record.
    #[error("corrupt row: {detail}")]
    CorruptRow {
        /// What failed to decode.
        detail: String,
    },

    /// A sibling list failed the contiguous-position re-check inside a
    /// write transaction. The transaction was rolled back.
    #[error("position invariant violated in {scope}: {positions:?}")]
    InvariantViolation {
        /// Which sibling list failed, e.g. `column <id>`.
        scope: String,
        /// The offending position multiset.
        positions: Vec<u32>,
    },

    /// Invalid database path.
    #[error("invalid database path: {path}")]
    InvalidPath {
        /// The invalid path.
        path: std::path::PathBuf,
    },
}

impl From<StorageError> for BoardError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvariantViolation { scope, positions } => {
                BoardError::InvariantViolation {
                    detail: format!("{scope}: {positions:?}"),
                }
            }
            other => BoardError::Internal(other.to_string()),
        }
    }
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_violation_maps_to_board_error_invariant() {
        let err = StorageError::InvariantViolation {
            scope: "column c1".into(),
            positions: vec![0, 2, 2],
        };
        let board_err: BoardError = err.into();
        assert!(matches!(board_err, BoardError::InvariantViolation { .. }));
        assert!(!board_err.is_user_facing());
    }

    #[test]
    fn corrupt_row_maps_to_internal() {
        let err = StorageError::CorruptRow {
            detail: "bad card id".into(),
        };
        let board_err: BoardError = err.into();
        assert!(matches!(board_err, BoardError::Internal(_)));
    }
}
