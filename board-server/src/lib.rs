//! # board-server
//!
//! The I/O layer of boardsync: cache-coherent persistence and realtime
//! broadcast for a collaborative task board.
//!
//! This crate wires the pure ordering logic of `board-core` to:
//! - SQLite persistence behind the [`storage::BoardStorage`] trait
//! - a tag-invalidated read-through cache ([`cache::BoardCache`])
//! - per-board presence channels ([`broadcast::BoardChannels`])
//!
//! ## Architecture
//!
//! ```text
//! Session A ──┐                        ┌── Session B
//!             │    (transport seam)    │
//!             ▼                        ▼
//!        ┌────────────────────────────────┐
//!        │          BoardServer           │
//!        │  auth ─► store ─► outbox ─►    │
//!        │            │       channels    │
//!        │  ┌─────────┴─────────┐         │
//!        │  │ cache │ SQLite    │         │
//!        │  └───────────────────┘         │
//!        └────────────────────────────────┘
//! ```
//!
//! A write flows: authorization predicate → position engine → one storage
//! transaction → tag invalidation → outbox events published to every joined
//! session except the originator.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod broadcast;
pub mod cache;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;
pub mod store;
