//! The position engine: dense, zero-based ordering of sibling entities.
//!
//! Every function here is pure. Inputs are sibling descriptors (id plus
//! current position) read by the caller; outputs are the minimal patch sets
//! that restore the contiguous `{0, ..., n-1}` sequence after an insert,
//! removal or move. Nothing here touches storage, which keeps the ordering
//! algorithm independently testable.
//!
//! Invalid inputs (a source position that does not exist among the supplied
//! siblings) are caller bugs and panic; user input problems such as an
//! out-of-range target index are clamped instead.

/// A sibling descriptor: one entity among those sharing a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sibling<I> {
    /// Entity id.
    pub id: I,
    /// Current dense position under the shared parent.
    pub position: u32,
}

impl<I> Sibling<I> {
    /// Convenience constructor.
    pub fn new(id: I, position: u32) -> Self {
        Self { id, position }
    }
}

/// One entry of a position patch: assign `position` to `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate<I> {
    /// Entity to update.
    pub id: I,
    /// Its new position.
    pub position: u32,
}

/// The effect of a same-parent reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan<I> {
    /// The moved entity's new position.
    pub new_position: u32,
    /// Position updates for the *other* siblings that shift.
    pub updates: Vec<PositionUpdate<I>>,
    /// The moved entity's position before the reorder.
    pub old_position: u32,
}

impl<I> ReorderPlan<I> {
    /// True when the move lands on the entity's current position.
    ///
    /// A no-op move is still a valid, idempotent request; the caller should
    /// skip the write entirely.
    pub fn is_noop(&self) -> bool {
        self.new_position == self.old_position && self.updates.is_empty()
    }
}

/// The effect of a cross-parent move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan<I> {
    /// The moved entity's position in the target list.
    pub new_position: u32,
    /// Compaction updates for the source siblings left behind.
    pub source_updates: Vec<PositionUpdate<I>>,
    /// Room-making updates for the target siblings.
    pub target_updates: Vec<PositionUpdate<I>>,
}

/// Position for an entity appended to the end of a sibling list.
pub fn compute_append(sibling_count: u32) -> u32 {
    sibling_count
}

/// Patch set restoring contiguity after removing the sibling at
/// `removed_position`: every position greater than it is decremented.
///
/// # Panics
///
/// Panics if `removed_position` is not a position held by one of
/// `siblings` - that is a caller bug, not a user input error.
pub fn compute_removal<I: Copy>(
    siblings: &[Sibling<I>],
    removed_position: u32,
) -> Vec<PositionUpdate<I>> {
    assert!(
        siblings.iter().any(|s| s.position == removed_position),
        "compute_removal: position {removed_position} not present among {} siblings",
        siblings.len()
    );

    let mut updates: Vec<PositionUpdate<I>> = siblings
        .iter()
        .filter(|s| s.position > removed_position)
        .map(|s| PositionUpdate {
            id: s.id,
            position: s.position - 1,
        })
        .collect();
    updates.sort_by_key(|u| u.position);
    updates
}

/// Plan a move within one sibling list.
///
/// Equivalent to removing the entity at `source_position`, compacting, then
/// inserting at `target_index` (clamped to the list that excludes the moved
/// entity) - an array move with no gaps.
///
/// # Panics
///
/// Panics if `source_position` is not a position held by one of `siblings`.
pub fn compute_reorder<I: Copy + PartialEq>(
    siblings: &[Sibling<I>],
    source_position: u32,
    target_index: u32,
) -> ReorderPlan<I> {
    let moved = siblings
        .iter()
        .find(|s| s.position == source_position)
        .unwrap_or_else(|| {
            panic!(
                "compute_reorder: position {source_position} not present among {} siblings",
                siblings.len()
            )
        });

    // Order without the moved entity, then reinsert at the clamped target.
    let mut order: Vec<Sibling<I>> = siblings
        .iter()
        .filter(|s| s.id != moved.id)
        .copied()
        .collect();
    order.sort_by_key(|s| s.position);

    let clamped = (target_index as usize).min(order.len());
    order.insert(clamped, *moved);

    let updates = order
        .iter()
        .enumerate()
        .filter(|(index, s)| s.id != moved.id && s.position != *index as u32)
        .map(|(index, s)| PositionUpdate {
            id: s.id,
            position: index as u32,
        })
        .collect();

    ReorderPlan {
        new_position: clamped as u32,
        updates,
        old_position: source_position,
    }
}

/// Plan a move from one sibling list into another.
///
/// The source list is compacted (positions above the departure point shift
/// down); target positions at or beyond the insertion point shift up to make
/// room. `target_index` is clamped to `[0, target.len()]` - the target list
/// never contains the moved entity.
///
/// # Panics
///
/// Panics if `source_position` is not a position held by one of `source`.
pub fn compute_transfer<I: Copy>(
    source: &[Sibling<I>],
    source_position: u32,
    target: &[Sibling<I>],
    target_index: u32,
) -> TransferPlan<I> {
    let source_updates = compute_removal(source, source_position);

    let new_position = (target_index as usize).min(target.len()) as u32;
    let mut target_updates: Vec<PositionUpdate<I>> = target
        .iter()
        .filter(|s| s.position >= new_position)
        .map(|s| PositionUpdate {
            id: s.id,
            position: s.position + 1,
        })
        .collect();
    target_updates.sort_by_key(|u| u.position);

    TransferPlan {
        new_position,
        source_updates,
        target_updates,
    }
}

/// Check that `positions` is exactly the set `{0, ..., n-1}` - no gaps, no
/// duplicates. Order does not matter.
pub fn verify_contiguous(positions: &[u32]) -> bool {
    let n = positions.len();
    let mut seen = vec![false; n];
    for &p in positions {
        let index = p as usize;
        if index >= n || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}
