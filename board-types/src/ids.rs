//! Typed identifiers for boardsync entities.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Create an identifier from raw bytes.
            ///
            /// Returns `None` unless exactly 16 bytes are supplied.
            pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
                uuid::Uuid::from_slice(bytes).ok().map(Self)
            }

            /// Get the raw bytes of this identifier.
            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }

            /// Get the inner UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), &self.to_string()[..8])
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for a board.
    BoardId
}

uuid_id! {
    /// A unique identifier for a column on a board.
    ColumnId
}

uuid_id! {
    /// A unique identifier for a card in a column.
    CardId
}

uuid_id! {
    /// A unique identifier for a user account.
    ///
    /// Account storage lives outside this core; only the id travels through it.
    UserId
}

uuid_id! {
    /// A unique identifier for a connected browser session.
    ///
    /// One user may hold several sessions; broadcast exclusion is per session,
    /// not per user.
    SessionId
}
