//! SQLite storage backend for board-server.

use super::BoardStorage;
use crate::error::StorageError;
use async_trait::async_trait;
use board_core::{verify_contiguous, PositionUpdate};
use board_types::{Board, BoardId, BoardTree, Card, CardId, Column, ColumnId, ColumnTree, UserId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::path::Path;
use std::str::FromStr;

/// SQLite-based board storage.
///
/// Uses WAL mode for concurrent reads/writes. SQLite serializes writers, so
/// two concurrent moves on the same column commit one after the other; each
/// re-checks contiguity against what it actually reads.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage from a database path.
    ///
    /// Creates the database file if it doesn't exist.
    pub async fn new(path: &Path) -> Result<Self, StorageError> {
        let path_str = path.to_str().ok_or_else(|| StorageError::InvalidPath {
            path: path.to_path_buf(),
        })?;
        let options = SqliteConnectOptions::from_str(path_str)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage (for testing).
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(":memory:")?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run database migrations.
    ///
    /// No UNIQUE constraint on (parent, position): SQLite enforces UNIQUE per
    /// row during multi-row shifts, which would abort legitimate patches.
    /// Contiguity is re-checked inside every position-changing transaction
    /// instead.
    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS boards (
                id BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                owner_id BLOB NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS columns (
                id BLOB PRIMARY KEY,
                board_id BLOB NOT NULL,
                name TEXT NOT NULL,
                position INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cards (
                id BLOB PRIMARY KEY,
                column_id BLOB NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                position INTEGER NOT NULL,
                assignee_id BLOB
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_columns_board_position ON columns(board_id, position)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cards_column_position ON cards(column_id, position)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_boards_owner ON boards(owner_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Re-check that a column's card positions form `{0..n-1}` inside an open
/// transaction. An error here rolls the transaction back.
async fn check_card_contiguity(
    conn: &mut SqliteConnection,
    column: ColumnId,
) -> Result<(), StorageError> {
    let rows: Vec<i64> =
        sqlx::query_scalar("SELECT position FROM cards WHERE column_id = ?1 ORDER BY position")
            .bind(column.as_bytes())
            .fetch_all(&mut *conn)
            .await?;
    let positions: Vec<u32> = rows.iter().map(|&p| p as u32).collect();
    if !verify_contiguous(&positions) {
        return Err(StorageError::InvariantViolation {
            scope: format!("column {column}"),
            positions,
        });
    }
    Ok(())
}

/// Same re-check for a board's column positions.
async fn check_column_contiguity(
    conn: &mut SqliteConnection,
    board: BoardId,
) -> Result<(), StorageError> {
    let rows: Vec<i64> =
        sqlx::query_scalar("SELECT position FROM columns WHERE board_id = ?1 ORDER BY position")
            .bind(board.as_bytes())
            .fetch_all(&mut *conn)
            .await?;
    let positions: Vec<u32> = rows.iter().map(|&p| p as u32).collect();
    if !verify_contiguous(&positions) {
        return Err(StorageError::InvariantViolation {
            scope: format!("board {board}"),
            positions,
        });
    }
    Ok(())
}

async fn apply_card_patch(
    conn: &mut SqliteConnection,
    patch: &[PositionUpdate<CardId>],
) -> Result<(), StorageError> {
    for update in patch {
        sqlx::query("UPDATE cards SET position = ?1 WHERE id = ?2")
            .bind(update.position as i64)
            .bind(update.id.as_bytes())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn apply_column_patch(
    conn: &mut SqliteConnection,
    patch: &[PositionUpdate<ColumnId>],
) -> Result<(), StorageError> {
    for update in patch {
        sqlx::query("UPDATE columns SET position = ?1 WHERE id = ?2")
            .bind(update.position as i64)
            .bind(update.id.as_bytes())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl BoardStorage for SqliteStorage {
    async fn load_board(&self, id: BoardId) -> Result<Option<Board>, StorageError> {
        let row = sqlx::query_as::<_, BoardRow>(
            "SELECT id, name, description, owner_id FROM boards WHERE id = ?1",
        )
        .bind(id.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Board::try_from).transpose()
    }

    async fn load_board_tree(&self, id: BoardId) -> Result<Option<BoardTree>, StorageError> {
        let Some(board) = self.load_board(id).await? else {
            return Ok(None);
        };
        let columns = self.list_columns(id).await?;

        // One query for every card on the board, grouped in memory.
        let card_rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT c.id, c.column_id, c.title, c.description, c.position, c.assignee_id
            FROM cards c
            JOIN columns col ON col.id = c.column_id
            WHERE col.board_id = ?1
            ORDER BY c.position
            "#,
        )
        .bind(id.as_bytes())
        .fetch_all(&self.pool)
        .await?;

        let mut cards_by_column: std::collections::HashMap<ColumnId, Vec<Card>> =
            std::collections::HashMap::new();
        for row in card_rows {
            let card = Card::try_from(row)?;
            cards_by_column.entry(card.column_id).or_default().push(card);
        }

        let columns = columns
            .into_iter()
            .map(|column| {
                let cards = cards_by_column.remove(&column.id).unwrap_or_default();
                ColumnTree { column, cards }
            })
            .collect();

        Ok(Some(BoardTree { board, columns }))
    }

    async fn boards_for_owner(&self, owner: UserId) -> Result<Vec<Board>, StorageError> {
        let rows = sqlx::query_as::<_, BoardRow>(
            r#"
            SELECT id, name, description, owner_id
            FROM boards
            WHERE owner_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(owner.as_bytes())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Board::try_from).collect()
    }

    async fn load_column(&self, id: ColumnId) -> Result<Option<Column>, StorageError> {
        let row = sqlx::query_as::<_, ColumnRow>(
            "SELECT id, board_id, name, position FROM columns WHERE id = ?1",
        )
        .bind(id.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Column::try_from).transpose()
    }

    async fn load_card(&self, id: CardId) -> Result<Option<Card>, StorageError> {
        let row = sqlx::query_as::<_, CardRow>(
            "SELECT id, column_id, title, description, position, assignee_id FROM cards WHERE id = ?1",
        )
        .bind(id.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Card::try_from).transpose()
    }

    async fn list_columns(&self, board: BoardId) -> Result<Vec<Column>, StorageError> {
        let rows = sqlx::query_as::<_, ColumnRow>(
            "SELECT id, board_id, name, position FROM columns WHERE board_id = ?1 ORDER BY position",
        )
        .bind(board.as_bytes())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Column::try_from).collect()
    }

    async fn list_cards(&self, column: ColumnId) -> Result<Vec<Card>, StorageError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, column_id, title, description, position, assignee_id
            FROM cards
            WHERE column_id = ?1
            ORDER BY position
            "#,
        )
        .bind(column.as_bytes())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Card::try_from).collect()
    }

    async fn board_id_of_column(
        &self,
        column: ColumnId,
    ) -> Result<Option<BoardId>, StorageError> {
        let row: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT board_id FROM columns WHERE id = ?1")
                .bind(column.as_bytes())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|bytes| {
            BoardId::from_bytes(&bytes).ok_or_else(|| StorageError::CorruptRow {
                detail: "board_id on column row".to_string(),
            })
        })
        .transpose()
    }

    async fn insert_board(&self, board: &Board) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO boards (id, name, description, owner_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(board.id.as_bytes())
        .bind(&board.name)
        .bind(&board.description)
        .bind(board.owner_id.as_bytes())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_column(&self, column: &Column) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO columns (id, board_id, name, position) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(column.id.as_bytes())
        .bind(column.board_id.as_bytes())
        .bind(&column.name)
        .bind(column.position as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_card(&self, card: &Card) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO cards (id, column_id, title, description, position, assignee_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(card.id.as_bytes())
        .bind(card.column_id.as_bytes())
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.position as i64)
        .bind(card.assignee_id.map(|a| a.as_bytes().to_vec()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_board(&self, board: &Board) -> Result<(), StorageError> {
        sqlx::query("UPDATE boards SET name = ?1, description = ?2 WHERE id = ?3")
            .bind(&board.name)
            .bind(&board.description)
            .bind(board.id.as_bytes())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_column(&self, column: &Column) -> Result<(), StorageError> {
        sqlx::query("UPDATE columns SET name = ?1 WHERE id = ?2")
            .bind(&column.name)
            .bind(column.id.as_bytes())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_card(&self, card: &Card) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE cards SET title = ?1, description = ?2, assignee_id = ?3 WHERE id = ?4",
        )
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.assignee_id.map(|a| a.as_bytes().to_vec()))
        .bind(card.id.as_bytes())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_board(&self, id: BoardId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM cards WHERE column_id IN (
                SELECT id FROM columns WHERE board_id = ?1
            )
            "#,
        )
        .bind(id.as_bytes())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM columns WHERE board_id = ?1")
            .bind(id.as_bytes())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM boards WHERE id = ?1")
            .bind(id.as_bytes())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_column(
        &self,
        id: ColumnId,
        board_id: BoardId,
        sibling_patch: &[PositionUpdate<ColumnId>],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cards WHERE column_id = ?1")
            .bind(id.as_bytes())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM columns WHERE id = ?1")
            .bind(id.as_bytes())
            .execute(&mut *tx)
            .await?;

        apply_column_patch(&mut tx, sibling_patch).await?;
        check_column_contiguity(&mut tx, board_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_card(
        &self,
        id: CardId,
        column_id: ColumnId,
        sibling_patch: &[PositionUpdate<CardId>],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cards WHERE id = ?1")
            .bind(id.as_bytes())
            .execute(&mut *tx)
            .await?;

        apply_card_patch(&mut tx, sibling_patch).await?;
        check_card_contiguity(&mut tx, column_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn move_card(
        &self,
        id: CardId,
        from_column: ColumnId,
        to_column: ColumnId,
        new_position: u32,
        source_patch: &[PositionUpdate<CardId>],
        target_patch: &[PositionUpdate<CardId>],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        apply_card_patch(&mut tx, source_patch).await?;
        apply_card_patch(&mut tx, target_patch).await?;

        // Column reference and position change as one unit.
        sqlx::query("UPDATE cards SET column_id = ?1, position = ?2 WHERE id = ?3")
            .bind(to_column.as_bytes())
            .bind(new_position as i64)
            .bind(id.as_bytes())
            .execute(&mut *tx)
            .await?;

        check_card_contiguity(&mut tx, from_column).await?;
        if to_column != from_column {
            check_card_contiguity(&mut tx, to_column).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn move_column(
        &self,
        id: ColumnId,
        board_id: BoardId,
        new_position: u32,
        sibling_patch: &[PositionUpdate<ColumnId>],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        apply_column_patch(&mut tx, sibling_patch).await?;

        sqlx::query("UPDATE columns SET position = ?1 WHERE id = ?2")
            .bind(new_position as i64)
            .bind(id.as_bytes())
            .execute(&mut *tx)
            .await?;

        check_column_contiguity(&mut tx, board_id).await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Internal row types for SQLite queries.
#[derive(sqlx::FromRow)]
struct BoardRow {
    id: Vec<u8>,
    name: String,
    description: Option<String>,
    owner_id: Vec<u8>,
}

impl TryFrom<BoardRow> for Board {
    type Error = StorageError;

    fn try_from(row: BoardRow) -> Result<Self, Self::Error> {
        Ok(Board {
            id: BoardId::from_bytes(&row.id).ok_or_else(|| StorageError::CorruptRow {
                detail: "board id".to_string(),
            })?,
            name: row.name,
            description: row.description,
            owner_id: UserId::from_bytes(&row.owner_id).ok_or_else(|| {
                StorageError::CorruptRow {
                    detail: "board owner_id".to_string(),
                }
            })?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    id: Vec<u8>,
    board_id: Vec<u8>,
    name: String,
    position: i64,
}

impl TryFrom<ColumnRow> for Column {
    type Error = StorageError;

    fn try_from(row: ColumnRow) -> Result<Self, Self::Error> {
        Ok(Column {
            id: ColumnId::from_bytes(&row.id).ok_or_else(|| StorageError::CorruptRow {
                detail: "column id".to_string(),
            })?,
            board_id: BoardId::from_bytes(&row.board_id).ok_or_else(|| {
                StorageError::CorruptRow {
                    detail: "column board_id".to_string(),
                }
            })?,
            name: row.name,
            position: row.position as u32,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CardRow {
    id: Vec<u8>,
    column_id: Vec<u8>,
    title: String,
    description: Option<String>,
    position: i64,
    assignee_id: Option<Vec<u8>>,
}

impl TryFrom<CardRow> for Card {
    type Error = StorageError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let assignee_id = row
            .assignee_id
            .map(|bytes| {
                UserId::from_bytes(&bytes).ok_or_else(|| StorageError::CorruptRow {
                    detail: "card assignee_id".to_string(),
                })
            })
            .transpose()?;

        Ok(Card {
            id: CardId::from_bytes(&row.id).ok_or_else(|| StorageError::CorruptRow {
                detail: "card id".to_string(),
            })?,
            column_id: ColumnId::from_bytes(&row.column_id).ok_or_else(|| {
                StorageError::CorruptRow {
                    detail: "card column_id".to_string(),
                }
            })?,
            title: row.title,
            description: row.description,
            position: row.position as u32,
            assignee_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(owner: UserId) -> Board {
        Board {
            id: BoardId::new(),
            name: "Sprint".to_string(),
            description: Some("current sprint".to_string()),
            owner_id: owner,
        }
    }

    fn column(board_id: BoardId, name: &str, position: u32) -> Column {
        Column {
            id: ColumnId::new(),
            board_id,
            name: name.to_string(),
            position,
        }
    }

    fn card(column_id: ColumnId, title: &str, position: u32) -> Card {
        Card {
            id: CardId::new(),
            column_id,
            title: title.to_string(),
            description: None,
            position,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn board_insert_and_load_roundtrip() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let original = board(UserId::new());

        storage.insert_board(&original).await.unwrap();
        let loaded = storage.load_board(original.id).await.unwrap().unwrap();
        assert_eq!(loaded, original);

        let missing = storage.load_board(BoardId::new()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn card_roundtrip_preserves_assignee() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let col = column(b.id, "To Do", 0);
        storage.insert_column(&col).await.unwrap();

        let mut c = card(col.id, "task", 0);
        c.assignee_id = Some(UserId::new());
        c.description = Some("details".to_string());
        storage.insert_card(&c).await.unwrap();

        let loaded = storage.load_card(c.id).await.unwrap().unwrap();
        assert_eq!(loaded, c);
    }

    #[tokio::test]
    async fn list_columns_ordered_by_position() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();

        // Insert out of order; listing must sort by position.
        let done = column(b.id, "Done", 2);
        let todo = column(b.id, "To Do", 0);
        let doing = column(b.id, "Doing", 1);
        for col in [&done, &todo, &doing] {
            storage.insert_column(col).await.unwrap();
        }

        let names: Vec<String> = storage
            .list_columns(b.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["To Do", "Doing", "Done"]);
    }

    #[tokio::test]
    async fn board_tree_groups_cards_under_their_columns() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let todo = column(b.id, "To Do", 0);
        let done = column(b.id, "Done", 1);
        storage.insert_column(&todo).await.unwrap();
        storage.insert_column(&done).await.unwrap();

        storage.insert_card(&card(todo.id, "A", 0)).await.unwrap();
        storage.insert_card(&card(todo.id, "B", 1)).await.unwrap();
        storage.insert_card(&card(done.id, "X", 0)).await.unwrap();

        let tree = storage.load_board_tree(b.id).await.unwrap().unwrap();
        assert_eq!(tree.board, b);
        assert_eq!(tree.columns.len(), 2);
        assert_eq!(tree.columns[0].column.name, "To Do");
        assert_eq!(tree.columns[0].cards.len(), 2);
        assert_eq!(tree.columns[0].cards[0].title, "A");
        assert_eq!(tree.columns[1].cards.len(), 1);
        assert_eq!(tree.card_count(), 3);
    }

    #[tokio::test]
    async fn boards_for_owner_excludes_other_owners() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let alice = UserId::new();
        let bob = UserId::new();

        storage.insert_board(&board(alice)).await.unwrap();
        storage.insert_board(&board(alice)).await.unwrap();
        storage.insert_board(&board(bob)).await.unwrap();

        assert_eq!(storage.boards_for_owner(alice).await.unwrap().len(), 2);
        assert_eq!(storage.boards_for_owner(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn board_id_of_column_resolves_without_loading() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let col = column(b.id, "To Do", 0);
        storage.insert_column(&col).await.unwrap();

        assert_eq!(
            storage.board_id_of_column(col.id).await.unwrap(),
            Some(b.id)
        );
        assert_eq!(
            storage.board_id_of_column(ColumnId::new()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn delete_board_cascades_to_columns_and_cards() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let col = column(b.id, "To Do", 0);
        storage.insert_column(&col).await.unwrap();
        let c = card(col.id, "A", 0);
        storage.insert_card(&c).await.unwrap();

        storage.delete_board(b.id).await.unwrap();

        assert!(storage.load_board(b.id).await.unwrap().is_none());
        assert!(storage.load_column(col.id).await.unwrap().is_none());
        assert!(storage.load_card(c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_column_cascades_and_compacts_siblings() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let first = column(b.id, "First", 0);
        let second = column(b.id, "Second", 1);
        let third = column(b.id, "Third", 2);
        for col in [&first, &second, &third] {
            storage.insert_column(col).await.unwrap();
        }
        let orphan = card(second.id, "doomed", 0);
        storage.insert_card(&orphan).await.unwrap();

        let patch = vec![PositionUpdate {
            id: third.id,
            position: 1,
        }];
        storage.delete_column(second.id, b.id, &patch).await.unwrap();

        assert!(storage.load_card(orphan.id).await.unwrap().is_none());
        let remaining = storage.list_columns(b.id).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].name, "First");
        assert_eq!(remaining[1].name, "Third");
        assert_eq!(remaining[1].position, 1);
    }

    #[tokio::test]
    async fn delete_card_applies_compaction_patch() {
        // column = [A(0), B(1), C(2)]; delete B -> [A(0), C(1)]
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let col = column(b.id, "To Do", 0);
        storage.insert_column(&col).await.unwrap();
        let a = card(col.id, "A", 0);
        let b_card = card(col.id, "B", 1);
        let c = card(col.id, "C", 2);
        for card in [&a, &b_card, &c] {
            storage.insert_card(card).await.unwrap();
        }

        let patch = vec![PositionUpdate {
            id: c.id,
            position: 1,
        }];
        storage.delete_card(b_card.id, col.id, &patch).await.unwrap();

        let titles: Vec<(String, u32)> = storage
            .list_cards(col.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.title, c.position))
            .collect();
        assert_eq!(titles, vec![("A".to_string(), 0), ("C".to_string(), 1)]);
    }

    #[tokio::test]
    async fn move_card_across_columns_is_atomic() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let todo = column(b.id, "To Do", 0);
        let done = column(b.id, "Done", 1);
        storage.insert_column(&todo).await.unwrap();
        storage.insert_column(&done).await.unwrap();
        let a = card(todo.id, "A", 0);
        let b_card = card(todo.id, "B", 1);
        let x = card(done.id, "X", 0);
        for card in [&a, &b_card, &x] {
            storage.insert_card(card).await.unwrap();
        }

        // Move A to "Done" index 0.
        let source_patch = vec![PositionUpdate {
            id: b_card.id,
            position: 0,
        }];
        let target_patch = vec![PositionUpdate {
            id: x.id,
            position: 1,
        }];
        storage
            .move_card(a.id, todo.id, done.id, 0, &source_patch, &target_patch)
            .await
            .unwrap();

        let todo_cards = storage.list_cards(todo.id).await.unwrap();
        assert_eq!(todo_cards.len(), 1);
        assert_eq!(todo_cards[0].title, "B");
        assert_eq!(todo_cards[0].position, 0);

        let done_cards = storage.list_cards(done.id).await.unwrap();
        assert_eq!(done_cards.len(), 2);
        assert_eq!(done_cards[0].title, "A");
        assert_eq!(done_cards[1].title, "X");

        let moved = storage.load_card(a.id).await.unwrap().unwrap();
        assert_eq!(moved.column_id, done.id);
        assert_eq!(moved.position, 0);
    }

    #[tokio::test]
    async fn move_card_with_bad_patch_rolls_back() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let col = column(b.id, "To Do", 0);
        storage.insert_column(&col).await.unwrap();
        let a = card(col.id, "A", 0);
        let b_card = card(col.id, "B", 1);
        storage.insert_card(&a).await.unwrap();
        storage.insert_card(&b_card).await.unwrap();

        // A patch that duplicates position 1 must fail the contiguity
        // re-check and leave the column untouched.
        let bogus = vec![PositionUpdate {
            id: b_card.id,
            position: 1,
        }];
        let err = storage
            .move_card(a.id, col.id, col.id, 1, &bogus, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvariantViolation { .. }));

        let cards = storage.list_cards(col.id).await.unwrap();
        assert_eq!(cards[0].title, "A");
        assert_eq!(cards[0].position, 0);
        assert_eq!(cards[1].title, "B");
        assert_eq!(cards[1].position, 1);
    }

    #[tokio::test]
    async fn move_column_reorders_board() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let b = board(UserId::new());
        storage.insert_board(&b).await.unwrap();
        let first = column(b.id, "First", 0);
        let second = column(b.id, "Second", 1);
        storage.insert_column(&first).await.unwrap();
        storage.insert_column(&second).await.unwrap();

        let patch = vec![PositionUpdate {
            id: second.id,
            position: 0,
        }];
        storage.move_column(first.id, b.id, 1, &patch).await.unwrap();

        let names: Vec<String> = storage
            .list_columns(b.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn file_backed_storage_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boards.db");

        let b = board(UserId::new());
        {
            let storage = SqliteStorage::new(&path).await.unwrap();
            storage.insert_board(&b).await.unwrap();
        }

        let reopened = SqliteStorage::new(&path).await.unwrap();
        let loaded = reopened.load_board(b.id).await.unwrap().unwrap();
        assert_eq!(loaded, b);
    }
}
