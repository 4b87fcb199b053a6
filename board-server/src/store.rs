//! Cache-coherent board store.
//!
//! All reads go through the tag-invalidated cache; all writes run the
//! authorization predicate, plan positions with the pure engine, commit one
//! storage transaction, flush the implicated cache tags, and hand the domain
//! events back to the caller as an outbox. Nothing is published from here;
//! publication happens after this function returns, so a failed write never
//! emits an event.

use crate::auth::{Action, Authorizer};
use crate::cache::{BoardCache, CacheKey, CacheTag, CachedValue};
use crate::config::CacheConfig;
use crate::storage::BoardStorage;
use board_core::{compute_append, compute_removal, compute_reorder, compute_transfer, Sibling};
use board_types::{
    Board, BoardError, BoardEvent, BoardId, BoardPatch, BoardResult, BoardTree, Card, CardId,
    CardPatch, Column, ColumnId, ColumnPatch, EntityKind, MoveCardRequest, MoveColumnRequest,
    UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The result of a committed write: the updated value, the board whose
/// channel the events belong on, and the events to publish post-commit.
#[derive(Debug)]
pub struct WriteOutcome<T> {
    /// The value as committed.
    pub value: T,
    /// The board the write happened on.
    pub board_id: BoardId,
    /// Events to broadcast to every joined session except the originator.
    /// Empty for no-op writes.
    pub events: Vec<BoardEvent>,
}

/// Cache-coherent store over a storage backend and an authorization policy.
pub struct BoardStore {
    storage: Arc<dyn BoardStorage>,
    authorizer: Arc<dyn Authorizer>,
    cache: Arc<BoardCache>,
    entity_ttl: Duration,
    list_ttl: Duration,
}

impl BoardStore {
    /// Wire a store over its collaborators.
    pub fn new(
        storage: Arc<dyn BoardStorage>,
        authorizer: Arc<dyn Authorizer>,
        cache: Arc<BoardCache>,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            storage,
            authorizer,
            cache,
            entity_ttl: Duration::from_secs(cache_config.entity_ttl_secs),
            list_ttl: Duration::from_secs(cache_config.list_ttl_secs),
        }
    }

    async fn authorize(
        &self,
        actor: UserId,
        action: Action,
        board_id: BoardId,
    ) -> BoardResult<()> {
        if self.authorizer.can_act_on(actor, action, board_id).await? {
            Ok(())
        } else {
            Err(BoardError::Forbidden {
                action: action.to_string(),
                board_id,
            })
        }
    }

    // ---- cached reads ----------------------------------------------------

    async fn read_board(&self, id: BoardId) -> BoardResult<Board> {
        let key = CacheKey::Board(id);
        if let Some(CachedValue::Board(board)) = self.cache.get(&key) {
            return Ok(board);
        }
        let board = self
            .storage
            .load_board(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Board, id))?;
        self.cache.insert(
            key,
            CachedValue::Board(board.clone()),
            vec![CacheTag::Board(id)],
            self.entity_ttl,
        );
        Ok(board)
    }

    async fn read_board_tree(&self, id: BoardId) -> BoardResult<BoardTree> {
        let key = CacheKey::BoardTree(id);
        if let Some(CachedValue::BoardTree(tree)) = self.cache.get(&key) {
            return Ok(tree);
        }
        let tree = self
            .storage
            .load_board_tree(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Board, id))?;
        self.cache.insert(
            key,
            CachedValue::BoardTree(tree.clone()),
            vec![CacheTag::Board(id)],
            self.entity_ttl,
        );
        Ok(tree)
    }

    async fn read_column(&self, id: ColumnId) -> BoardResult<Column> {
        let key = CacheKey::Column(id);
        if let Some(CachedValue::Column(column)) = self.cache.get(&key) {
            return Ok(column);
        }
        let column = self
            .storage
            .load_column(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Column, id))?;
        self.cache.insert(
            key,
            CachedValue::Column(column.clone()),
            vec![CacheTag::Board(column.board_id)],
            self.entity_ttl,
        );
        Ok(column)
    }

    async fn read_card(&self, id: CardId) -> BoardResult<(Card, BoardId)> {
        let key = CacheKey::Card(id);
        if let Some(CachedValue::Card(card)) = self.cache.get(&key) {
            let board_id = self.board_of_column(card.column_id).await?;
            return Ok((card, board_id));
        }
        let card = self
            .storage
            .load_card(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Card, id))?;
        let board_id = self.board_of_column(card.column_id).await?;
        self.cache.insert(
            key,
            CachedValue::Card(card.clone()),
            vec![CacheTag::Board(board_id)],
            self.entity_ttl,
        );
        Ok((card, board_id))
    }

    async fn board_of_column(&self, column: ColumnId) -> BoardResult<BoardId> {
        self.storage
            .board_id_of_column(column)
            .await?
            .ok_or_else(|| BoardError::Internal(format!("column {column} has no board row")))
    }

    /// Fetch a board, read-through cached.
    pub async fn get_board(&self, actor: UserId, id: BoardId) -> BoardResult<Board> {
        let board = self.read_board(id).await?;
        self.authorize(actor, Action::View, id).await?;
        Ok(board)
    }

    /// Fetch a board with its ordered columns and cards, read-through cached.
    pub async fn get_board_tree(&self, actor: UserId, id: BoardId) -> BoardResult<BoardTree> {
        let tree = self.read_board_tree(id).await?;
        self.authorize(actor, Action::View, id).await?;
        Ok(tree)
    }

    /// Fetch a column, read-through cached.
    pub async fn get_column(&self, actor: UserId, id: ColumnId) -> BoardResult<Column> {
        let column = self.read_column(id).await?;
        self.authorize(actor, Action::View, column.board_id).await?;
        Ok(column)
    }

    /// Fetch a card, read-through cached.
    pub async fn get_card(&self, actor: UserId, id: CardId) -> BoardResult<Card> {
        let (card, board_id) = self.read_card(id).await?;
        self.authorize(actor, Action::View, board_id).await?;
        Ok(card)
    }

    /// The actor's own boards, newest first, read-through cached.
    pub async fn boards_for(&self, actor: UserId) -> BoardResult<Vec<Board>> {
        let key = CacheKey::OwnerBoards(actor);
        if let Some(CachedValue::Boards(boards)) = self.cache.get(&key) {
            return Ok(boards);
        }
        let boards = self.storage.boards_for_owner(actor).await?;
        self.cache.insert(
            key,
            CachedValue::Boards(boards.clone()),
            vec![CacheTag::OwnerBoards(actor)],
            self.list_ttl,
        );
        Ok(boards)
    }

    // ---- writes ----------------------------------------------------------

    /// Create a board owned by the actor. No predicate applies: ownership is
    /// established by the act itself.
    pub async fn create_board(
        &self,
        actor: UserId,
        name: String,
        description: Option<String>,
    ) -> BoardResult<WriteOutcome<Board>> {
        let board = Board {
            id: BoardId::new(),
            name,
            description,
            owner_id: actor,
        };
        self.storage.insert_board(&board).await?;
        self.cache.flush_tag(&CacheTag::OwnerBoards(actor));
        debug!(board = %board.id, "board created");
        Ok(WriteOutcome {
            board_id: board.id,
            value: board,
            // A board nobody could have joined yet has nobody to notify.
            events: vec![],
        })
    }

    /// Apply a partial update to a board.
    pub async fn update_board(
        &self,
        actor: UserId,
        id: BoardId,
        patch: BoardPatch,
    ) -> BoardResult<WriteOutcome<Board>> {
        let board = self
            .storage
            .load_board(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Board, id))?;
        self.authorize(actor, Action::Update, id).await?;

        if !patch.is_change() {
            return Ok(WriteOutcome {
                value: board,
                board_id: id,
                events: vec![],
            });
        }

        let updated = Board {
            name: patch.name.apply(board.name),
            description: patch.description.apply_opt(board.description),
            ..board
        };
        self.storage.update_board(&updated).await?;
        self.cache.flush_tag(&CacheTag::Board(id));
        self.cache
            .flush_tag(&CacheTag::OwnerBoards(updated.owner_id));
        Ok(WriteOutcome {
            value: updated,
            board_id: id,
            events: vec![BoardEvent::BoardUpdated { board_id: id }],
        })
    }

    /// Delete a board and everything on it.
    pub async fn delete_board(&self, actor: UserId, id: BoardId) -> BoardResult<WriteOutcome<()>> {
        let board = self
            .storage
            .load_board(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Board, id))?;
        self.authorize(actor, Action::Delete, id).await?;

        self.storage.delete_board(id).await?;
        self.cache.flush_tag(&CacheTag::Board(id));
        self.cache.flush_tag(&CacheTag::OwnerBoards(board.owner_id));
        debug!(board = %id, "board deleted");
        // The channel itself disappears with the board; there is no event to
        // deliver on it.
        Ok(WriteOutcome {
            value: (),
            board_id: id,
            events: vec![],
        })
    }

    /// Append a column to the end of a board.
    pub async fn create_column(
        &self,
        actor: UserId,
        board_id: BoardId,
        name: String,
    ) -> BoardResult<WriteOutcome<Column>> {
        self.storage
            .load_board(board_id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Board, board_id))?;
        self.authorize(actor, Action::Create, board_id).await?;

        let siblings = self.storage.list_columns(board_id).await?;
        let column = Column {
            id: ColumnId::new(),
            board_id,
            name,
            position: compute_append(siblings.len() as u32),
        };
        self.storage.insert_column(&column).await?;
        self.cache.flush_tag(&CacheTag::Board(board_id));
        Ok(WriteOutcome {
            value: column,
            board_id,
            events: vec![BoardEvent::BoardUpdated { board_id }],
        })
    }

    /// Apply a partial update to a column.
    pub async fn update_column(
        &self,
        actor: UserId,
        id: ColumnId,
        patch: ColumnPatch,
    ) -> BoardResult<WriteOutcome<Column>> {
        let column = self
            .storage
            .load_column(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Column, id))?;
        self.authorize(actor, Action::Update, column.board_id).await?;

        if !patch.is_change() {
            return Ok(WriteOutcome {
                board_id: column.board_id,
                value: column,
                events: vec![],
            });
        }

        let updated = Column {
            name: patch.name.apply(column.name),
            ..column
        };
        self.storage.update_column(&updated).await?;
        self.cache.flush_tag(&CacheTag::Board(updated.board_id));
        Ok(WriteOutcome {
            board_id: updated.board_id,
            events: vec![BoardEvent::BoardUpdated {
                board_id: updated.board_id,
            }],
            value: updated,
        })
    }

    /// Delete a column with all its cards, compacting the board's remaining
    /// columns.
    pub async fn delete_column(
        &self,
        actor: UserId,
        id: ColumnId,
    ) -> BoardResult<WriteOutcome<()>> {
        let column = self
            .storage
            .load_column(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Column, id))?;
        self.authorize(actor, Action::Delete, column.board_id).await?;

        let siblings: Vec<Sibling<ColumnId>> = self
            .storage
            .list_columns(column.board_id)
            .await?
            .iter()
            .map(|c| Sibling::new(c.id, c.position))
            .collect();
        let patch = compute_removal(&siblings, column.position);

        self.storage
            .delete_column(id, column.board_id, &patch)
            .await?;
        self.cache.flush_tag(&CacheTag::Board(column.board_id));
        Ok(WriteOutcome {
            value: (),
            board_id: column.board_id,
            events: vec![BoardEvent::ColumnDeleted {
                board_id: column.board_id,
                column_id: id,
            }],
        })
    }

    /// Append a card to the end of a column.
    pub async fn create_card(
        &self,
        actor: UserId,
        column_id: ColumnId,
        title: String,
        description: Option<String>,
    ) -> BoardResult<WriteOutcome<Card>> {
        let column = self
            .storage
            .load_column(column_id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Column, column_id))?;
        self.authorize(actor, Action::Create, column.board_id).await?;

        let siblings = self.storage.list_cards(column_id).await?;
        let card = Card {
            id: CardId::new(),
            column_id,
            title,
            description,
            position: compute_append(siblings.len() as u32),
            assignee_id: None,
        };
        self.storage.insert_card(&card).await?;
        self.cache.flush_tag(&CacheTag::Board(column.board_id));
        Ok(WriteOutcome {
            value: card,
            board_id: column.board_id,
            events: vec![BoardEvent::BoardUpdated {
                board_id: column.board_id,
            }],
        })
    }

    /// Apply a partial update to a card.
    pub async fn update_card(
        &self,
        actor: UserId,
        id: CardId,
        patch: CardPatch,
    ) -> BoardResult<WriteOutcome<Card>> {
        let card = self
            .storage
            .load_card(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Card, id))?;
        let board_id = self.board_of_column(card.column_id).await?;
        self.authorize(actor, Action::Update, board_id).await?;

        if !patch.is_change() {
            return Ok(WriteOutcome {
                value: card,
                board_id,
                events: vec![],
            });
        }

        let updated = Card {
            title: patch.title.apply(card.title),
            description: patch.description.apply_opt(card.description),
            assignee_id: patch.assignee_id.apply_opt(card.assignee_id),
            ..card
        };
        self.storage.update_card(&updated).await?;
        self.cache.flush_tag(&CacheTag::Board(board_id));
        Ok(WriteOutcome {
            value: updated,
            board_id,
            events: vec![BoardEvent::BoardUpdated { board_id }],
        })
    }

    /// Delete a card, compacting its column.
    pub async fn delete_card(&self, actor: UserId, id: CardId) -> BoardResult<WriteOutcome<()>> {
        let card = self
            .storage
            .load_card(id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Card, id))?;
        let board_id = self.board_of_column(card.column_id).await?;
        self.authorize(actor, Action::Delete, board_id).await?;

        let siblings: Vec<Sibling<CardId>> = self
            .storage
            .list_cards(card.column_id)
            .await?
            .iter()
            .map(|c| Sibling::new(c.id, c.position))
            .collect();
        let patch = compute_removal(&siblings, card.position);

        self.storage.delete_card(id, card.column_id, &patch).await?;
        self.cache.flush_tag(&CacheTag::Board(board_id));
        Ok(WriteOutcome {
            value: (),
            board_id,
            events: vec![BoardEvent::CardDeleted {
                board_id,
                card_id: id,
            }],
        })
    }

    /// Move a card within its column or to another column on the same board.
    ///
    /// The requested position is clamped to the valid range. A move that
    /// lands a card where it already is succeeds without touching storage
    /// and emits no event.
    pub async fn move_card(
        &self,
        actor: UserId,
        request: MoveCardRequest,
    ) -> BoardResult<WriteOutcome<Card>> {
        let card = self
            .storage
            .load_card(request.card_id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Card, request.card_id))?;
        let board_id = self.board_of_column(card.column_id).await?;
        self.authorize(actor, Action::Move, board_id).await?;

        let target = self
            .storage
            .load_column(request.column_id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Column, request.column_id))?;
        if target.board_id != board_id {
            return Err(BoardError::CrossParentViolation {
                card_id: card.id,
                target_board_id: target.board_id,
            });
        }

        let source_siblings: Vec<Sibling<CardId>> = self
            .storage
            .list_cards(card.column_id)
            .await?
            .iter()
            .map(|c| Sibling::new(c.id, c.position))
            .collect();

        let new_position = if target.id == card.column_id {
            let plan = compute_reorder(&source_siblings, card.position, request.position);
            if plan.is_noop() {
                debug!(card = %card.id, "no-op move");
                return Ok(WriteOutcome {
                    value: card,
                    board_id,
                    events: vec![],
                });
            }
            self.storage
                .move_card(
                    card.id,
                    card.column_id,
                    card.column_id,
                    plan.new_position,
                    &plan.updates,
                    &[],
                )
                .await?;
            plan.new_position
        } else {
            let target_siblings: Vec<Sibling<CardId>> = self
                .storage
                .list_cards(target.id)
                .await?
                .iter()
                .map(|c| Sibling::new(c.id, c.position))
                .collect();
            let plan = compute_transfer(
                &source_siblings,
                card.position,
                &target_siblings,
                request.position,
            );
            self.storage
                .move_card(
                    card.id,
                    card.column_id,
                    target.id,
                    plan.new_position,
                    &plan.source_updates,
                    &plan.target_updates,
                )
                .await?;
            plan.new_position
        };

        self.cache.flush_tag(&CacheTag::Board(board_id));
        let from_column_id = card.column_id;
        let moved = Card {
            column_id: target.id,
            position: new_position,
            ..card
        };
        Ok(WriteOutcome {
            board_id,
            events: vec![BoardEvent::CardMoved {
                card_id: moved.id,
                from_column_id,
                to_column_id: target.id,
                position: new_position,
            }],
            value: moved,
        })
    }

    /// Move a column within its board. Clamped and idempotent like card
    /// moves.
    pub async fn move_column(
        &self,
        actor: UserId,
        request: MoveColumnRequest,
    ) -> BoardResult<WriteOutcome<Column>> {
        let column = self
            .storage
            .load_column(request.column_id)
            .await?
            .ok_or_else(|| BoardError::not_found(EntityKind::Column, request.column_id))?;
        self.authorize(actor, Action::Move, column.board_id).await?;

        let siblings: Vec<Sibling<ColumnId>> = self
            .storage
            .list_columns(column.board_id)
            .await?
            .iter()
            .map(|c| Sibling::new(c.id, c.position))
            .collect();
        let plan = compute_reorder(&siblings, column.position, request.position);
        if plan.is_noop() {
            return Ok(WriteOutcome {
                board_id: column.board_id,
                value: column,
                events: vec![],
            });
        }

        self.storage
            .move_column(column.id, column.board_id, plan.new_position, &plan.updates)
            .await?;
        self.cache.flush_tag(&CacheTag::Board(column.board_id));
        let moved = Column {
            position: plan.new_position,
            ..column
        };
        Ok(WriteOutcome {
            board_id: moved.board_id,
            events: vec![BoardEvent::BoardUpdated {
                board_id: moved.board_id,
            }],
            value: moved,
        })
    }
}
