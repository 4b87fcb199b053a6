//! Domain events delivered over board channels.
//!
//! Payloads are self-contained: they carry the ids, new position and new
//! parent a receiver needs to reconcile its local view for the common cases
//! (move, delete). A receiver may always fall back to re-fetching the board.

use crate::{BoardId, CardId, ColumnId, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// A board-visible state change, broadcast to every joined session except
/// the one that originated the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BoardEvent {
    /// A card changed position and/or column.
    #[serde(rename = "card.moved")]
    CardMoved {
        /// The moved card.
        card_id: CardId,
        /// Column the card left.
        from_column_id: ColumnId,
        /// Column the card now belongs to (may equal `from_column_id`).
        to_column_id: ColumnId,
        /// The card's new position in the target column.
        position: u32,
    },

    /// A card was deleted.
    #[serde(rename = "card.deleted")]
    CardDeleted {
        /// The board the card belonged to.
        board_id: BoardId,
        /// The deleted card.
        card_id: CardId,
    },

    /// A column was deleted together with all its cards.
    #[serde(rename = "column.deleted")]
    ColumnDeleted {
        /// The board the column belonged to.
        board_id: BoardId,
        /// The deleted column.
        column_id: ColumnId,
    },

    /// The board changed in a way with no dedicated payload; receivers
    /// should re-fetch the board state.
    #[serde(rename = "board.updated")]
    BoardUpdated {
        /// The board that changed.
        board_id: BoardId,
    },
}

impl BoardEvent {
    /// The wire name of this event, e.g. `card.moved`.
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::CardMoved { .. } => "card.moved",
            BoardEvent::CardDeleted { .. } => "card.deleted",
            BoardEvent::ColumnDeleted { .. } => "column.deleted",
            BoardEvent::BoardUpdated { .. } => "board.updated",
        }
    }
}

/// A session present on a board channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// The joined session.
    pub session_id: SessionId,
    /// The user behind the session.
    pub user_id: UserId,
    /// Display name shown to other members.
    pub name: String,
}

/// A change to the set of sessions present on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterUpdate {
    /// A session joined the channel.
    Joined(Presence),
    /// A session left the channel.
    Left {
        /// The departed session.
        session_id: SessionId,
    },
}

/// Everything a joined session can receive on a board channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelFrame {
    /// Who else is present changed.
    Roster(RosterUpdate),
    /// A domain event from another session's write.
    Event(BoardEvent),
}
