//! # board-types
//!
//! Foundational types for the boardsync task board core.
//!
//! This crate provides the types shared by every boardsync crate:
//! - [`BoardId`], [`ColumnId`], [`CardId`], [`UserId`], [`SessionId`] - Typed identifiers
//! - [`Board`], [`Column`], [`Card`] - Domain entities with dense positions
//! - [`BoardEvent`], [`ChannelFrame`] - Events delivered over board channels
//! - [`FieldUpdate`] - Tagged partial-update fields
//! - [`BoardError`] - User-facing error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entities;
mod error;
mod events;
mod ids;
mod requests;
mod update;

pub use entities::{Board, BoardTree, Card, Column, ColumnTree};
pub use error::{BoardError, BoardResult, EntityKind};
pub use events::{BoardEvent, ChannelFrame, Presence, RosterUpdate};
pub use ids::{BoardId, CardId, ColumnId, SessionId, UserId};
pub use requests::{MoveCardRequest, MoveColumnRequest};
pub use update::{BoardPatch, CardPatch, ColumnPatch, FieldUpdate};
