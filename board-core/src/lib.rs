//! # board-core
//!
//! Pure logic for boardsync (no I/O, instant tests).
//!
//! This crate implements the position-ordering engine and the board-channel
//! lifecycle without any storage or network I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about ordering invariants
//!
//! The I/O layer (`board-server`) runs these computations against sibling
//! lists it reads inside a storage transaction and applies the returned
//! patch sets atomically.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod position;

pub use channel::{ChannelAction, ChannelEvent, ChannelState};
pub use position::{
    compute_append, compute_removal, compute_reorder, compute_transfer, verify_contiguous,
    PositionUpdate, ReorderPlan, Sibling, TransferPlan,
};
