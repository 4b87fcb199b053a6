//! Tag-invalidated read-through cache.
//!
//! Every entry carries the tags of the aggregates it was derived from. A
//! write flushes the implicated tags, removing all derived entries at once
//! without enumerating them. TTL expiry is the fallback for any invalidation
//! that slips through.

use board_types::{Board, BoardId, BoardTree, Card, CardId, Column, ColumnId, UserId};
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Key identifying one cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A bare board record.
    Board(BoardId),
    /// A board with its full column/card tree.
    BoardTree(BoardId),
    /// A single column.
    Column(ColumnId),
    /// A single card.
    Card(CardId),
    /// A user's owned-board list.
    OwnerBoards(UserId),
}

/// Invalidation tag. Coarser than keys: one tag covers every entry derived
/// from the same aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTag {
    /// Everything derived from one board's content.
    Board(BoardId),
    /// A user's board-list views.
    OwnerBoards(UserId),
}

/// A cached read result.
#[derive(Debug, Clone)]
pub enum CachedValue {
    /// A bare board.
    Board(Board),
    /// An expanded board tree.
    BoardTree(BoardTree),
    /// A column.
    Column(Column),
    /// A card.
    Card(Card),
    /// A board list.
    Boards(Vec<Board>),
}

struct CacheEntry {
    value: CachedValue,
    tags: Vec<CacheTag>,
    expires_at: Instant,
}

/// Concurrent cache keyed by [`CacheKey`], flushed by [`CacheTag`].
#[derive(Default)]
pub struct BoardCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl BoardCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key. Expired entries are evicted on read and reported as a
    /// miss.
    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert a value under `key`, tagged for invalidation.
    pub fn insert(&self, key: CacheKey, value: CachedValue, tags: Vec<CacheTag>, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                tags,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove a single key.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Remove every entry carrying `tag`. Returns the number of entries
    /// removed.
    pub fn flush_tag(&self, tag: &CacheTag) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.tags.contains(tag));
        before - self.entries.len()
    }

    /// Evict every expired entry. Returns the number evicted.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Number of live (including expired-but-unswept) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
