//! The request surface: store writes followed by post-commit publication.
//!
//! [`BoardServer`] is what a transport (WebSocket handler, RPC endpoint)
//! calls into. Every write goes through the cache-coherent store first; only
//! after the store reports a committed outcome are its events handed to the
//! channels, so a failed or no-op write never broadcasts anything. The
//! originating session is always excluded from delivery - it already has the
//! operation's return value.

use crate::auth::{Authorizer, OwnerAuthorizer};
use crate::broadcast::BoardChannels;
use crate::cache::BoardCache;
use crate::cleanup::spawn_cache_sweeper;
use crate::config::{CacheConfig, Config};
use crate::error::ServerError;
use crate::storage::{BoardStorage, SqliteStorage};
use crate::store::{BoardStore, WriteOutcome};
use board_types::{
    Board, BoardId, BoardPatch, BoardResult, BoardTree, Card, CardId, CardPatch, ChannelFrame,
    Column, ColumnId, ColumnPatch, MoveCardRequest, MoveColumnRequest, Presence, SessionId,
    UserId,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The authenticated originator of a request: who is acting, and which
/// session (hence channel membership) the action came from.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// The acting user.
    pub user_id: UserId,
    /// The session the request arrived on.
    pub session_id: SessionId,
}

impl Actor {
    /// Pair a user with a fresh session.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            session_id: SessionId::new(),
        }
    }
}

/// Store plus channels behind one request surface.
pub struct BoardServer {
    store: BoardStore,
    channels: BoardChannels,
    sweeper: Option<JoinHandle<()>>,
}

impl BoardServer {
    /// Open a server against the configured SQLite database.
    pub async fn open(config: &Config) -> Result<Self, ServerError> {
        let storage = Arc::new(SqliteStorage::new(&config.storage.database).await?);
        Ok(Self::with_storage(storage, &config.cache))
    }

    /// Wire a server over an existing storage backend with the default
    /// owner-only authorization policy.
    pub fn with_storage(storage: Arc<dyn BoardStorage>, cache_config: &CacheConfig) -> Self {
        let authorizer: Arc<dyn Authorizer> = Arc::new(OwnerAuthorizer::new(storage.clone()));
        Self::with_parts(storage, authorizer, cache_config)
    }

    /// Wire a server over explicit storage and authorization collaborators.
    pub fn with_parts(
        storage: Arc<dyn BoardStorage>,
        authorizer: Arc<dyn Authorizer>,
        cache_config: &CacheConfig,
    ) -> Self {
        let cache = Arc::new(BoardCache::new());
        let store = BoardStore::new(storage, authorizer.clone(), cache.clone(), cache_config);
        let channels = BoardChannels::new(authorizer);
        let sweeper = spawn_cache_sweeper(cache, cache_config);
        Self {
            store,
            channels,
            sweeper,
        }
    }

    fn publish<T>(&self, actor: Actor, outcome: &WriteOutcome<T>) {
        for event in &outcome.events {
            self.channels.publish(outcome.board_id, actor.session_id, event);
        }
    }

    // ---- reads -----------------------------------------------------------

    /// Fetch a board.
    pub async fn get_board(&self, actor: Actor, id: BoardId) -> BoardResult<Board> {
        self.store.get_board(actor.user_id, id).await
    }

    /// Fetch a board with its ordered columns and cards.
    pub async fn get_board_tree(&self, actor: Actor, id: BoardId) -> BoardResult<BoardTree> {
        self.store.get_board_tree(actor.user_id, id).await
    }

    /// Fetch a column.
    pub async fn get_column(&self, actor: Actor, id: ColumnId) -> BoardResult<Column> {
        self.store.get_column(actor.user_id, id).await
    }

    /// Fetch a card.
    pub async fn get_card(&self, actor: Actor, id: CardId) -> BoardResult<Card> {
        self.store.get_card(actor.user_id, id).await
    }

    /// The actor's own boards, newest first.
    pub async fn list_boards(&self, actor: Actor) -> BoardResult<Vec<Board>> {
        self.store.boards_for(actor.user_id).await
    }

    // ---- writes ----------------------------------------------------------

    /// Create a board owned by the actor.
    pub async fn create_board(
        &self,
        actor: Actor,
        name: String,
        description: Option<String>,
    ) -> BoardResult<Board> {
        let outcome = self.store.create_board(actor.user_id, name, description).await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    /// Apply a partial update to a board.
    pub async fn update_board(
        &self,
        actor: Actor,
        id: BoardId,
        patch: BoardPatch,
    ) -> BoardResult<Board> {
        let outcome = self.store.update_board(actor.user_id, id, patch).await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    /// Delete a board, its columns and cards, and tear down its channel.
    pub async fn delete_board(&self, actor: Actor, id: BoardId) -> BoardResult<()> {
        let outcome = self.store.delete_board(actor.user_id, id).await?;
        self.publish(actor, &outcome);
        self.channels.close(id);
        Ok(())
    }

    /// Append a column to a board.
    pub async fn create_column(
        &self,
        actor: Actor,
        board_id: BoardId,
        name: String,
    ) -> BoardResult<Column> {
        let outcome = self.store.create_column(actor.user_id, board_id, name).await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    /// Apply a partial update to a column.
    pub async fn update_column(
        &self,
        actor: Actor,
        id: ColumnId,
        patch: ColumnPatch,
    ) -> BoardResult<Column> {
        let outcome = self.store.update_column(actor.user_id, id, patch).await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    /// Delete a column and all its cards.
    pub async fn delete_column(&self, actor: Actor, id: ColumnId) -> BoardResult<()> {
        let outcome = self.store.delete_column(actor.user_id, id).await?;
        self.publish(actor, &outcome);
        Ok(())
    }

    /// Append a card to a column.
    pub async fn create_card(
        &self,
        actor: Actor,
        column_id: ColumnId,
        title: String,
        description: Option<String>,
    ) -> BoardResult<Card> {
        let outcome = self
            .store
            .create_card(actor.user_id, column_id, title, description)
            .await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    /// Apply a partial update to a card.
    pub async fn update_card(
        &self,
        actor: Actor,
        id: CardId,
        patch: CardPatch,
    ) -> BoardResult<Card> {
        let outcome = self.store.update_card(actor.user_id, id, patch).await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    /// Delete a card.
    pub async fn delete_card(&self, actor: Actor, id: CardId) -> BoardResult<()> {
        let outcome = self.store.delete_card(actor.user_id, id).await?;
        self.publish(actor, &outcome);
        Ok(())
    }

    /// Move a card within or across columns of its board.
    pub async fn move_card(&self, actor: Actor, request: MoveCardRequest) -> BoardResult<Card> {
        let outcome = self.store.move_card(actor.user_id, request).await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    /// Move a column within its board.
    pub async fn move_column(
        &self,
        actor: Actor,
        request: MoveColumnRequest,
    ) -> BoardResult<Column> {
        let outcome = self.store.move_column(actor.user_id, request).await?;
        self.publish(actor, &outcome);
        Ok(outcome.value)
    }

    // ---- channels --------------------------------------------------------

    /// Join a board's channel. Returns the sessions already present and the
    /// receiver for roster updates and domain events.
    pub async fn join_board(
        &self,
        actor: Actor,
        board_id: BoardId,
        display_name: String,
    ) -> BoardResult<(Vec<Presence>, mpsc::UnboundedReceiver<ChannelFrame>)> {
        let presence = Presence {
            session_id: actor.session_id,
            user_id: actor.user_id,
            name: display_name,
        };
        self.channels.join(board_id, presence).await
    }

    /// Leave a board's channel.
    pub fn leave_board(&self, actor: Actor, board_id: BoardId) {
        self.channels.leave(board_id, actor.session_id);
    }

    /// Sessions currently on a board's channel.
    pub fn roster(&self, board_id: BoardId) -> Vec<Presence> {
        self.channels.roster(board_id)
    }
}

impl Drop for BoardServer {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}
