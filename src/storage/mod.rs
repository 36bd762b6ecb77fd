use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::StorageOptions;

mod schema;

const TODO_COLUMNS: &str = "id, todo, completed, created_at, updated_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid todo: {0}")]
    Validation(&'static str),
    #[error("todo {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRecord {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cheap to clone; every operation opens its own connection so request
/// handlers never share one across threads.
#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn create(&self, text: &str) -> Result<TodoRecord> {
        let text = normalize_text(text)?;
        self.with_connection(|conn| {
            let now = unix_now();
            let todo = conn.query_row(
                &format!(
                    "INSERT INTO todos (todo, completed, created_at, updated_at)
                     VALUES (?1, 0, ?2, ?2)
                     RETURNING {TODO_COLUMNS}"
                ),
                params![text, now],
                todo_from_row,
            )?;
            tracing::debug!(id = todo.id, "created todo");
            Ok(todo)
        })
    }

    pub fn get(&self, id: i64) -> Result<TodoRecord> {
        self.with_connection(|conn| {
            conn.query_row(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                params![id],
                todo_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
        })
    }

    pub fn list(&self) -> Result<Vec<TodoRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TODO_COLUMNS} FROM todos ORDER BY id ASC"
            ))?;
            let todos = stmt
                .query_map([], todo_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(todos)
        })
    }

    pub fn list_by_status(&self, completed: bool) -> Result<Vec<TodoRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TODO_COLUMNS} FROM todos WHERE completed = ?1 ORDER BY id ASC"
            ))?;
            let todos = stmt
                .query_map(params![if completed { 1 } else { 0 }], todo_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(todos)
        })
    }

    pub fn update_text(&self, id: i64, text: &str) -> Result<TodoRecord> {
        let text = normalize_text(text)?;
        self.with_connection(|conn| {
            conn.query_row(
                &format!(
                    "UPDATE todos SET todo = ?1, updated_at = ?2 WHERE id = ?3
                     RETURNING {TODO_COLUMNS}"
                ),
                params![text, unix_now(), id],
                todo_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
        })
    }

    pub fn set_status(&self, id: i64, completed: bool) -> Result<TodoRecord> {
        self.with_connection(|conn| {
            conn.query_row(
                &format!(
                    "UPDATE todos SET completed = ?1, updated_at = ?2 WHERE id = ?3
                     RETURNING {TODO_COLUMNS}"
                ),
                params![if completed { 1 } else { 0 }, unix_now(), id],
                todo_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
        })
    }

    /// Flips `completed` in one statement, so two concurrent toggles of the
    /// same row cannot both read the old value.
    pub fn toggle_status(&self, id: i64) -> Result<TodoRecord> {
        self.with_connection(|conn| {
            conn.query_row(
                &format!(
                    "UPDATE todos SET completed = 1 - completed, updated_at = ?1 WHERE id = ?2
                     RETURNING {TODO_COLUMNS}"
                ),
                params![unix_now(), id],
                todo_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
        })
    }

    pub fn set_all_status(&self, completed: bool) -> Result<usize> {
        self.with_connection(|conn| {
            let updated = conn.execute(
                "UPDATE todos SET completed = ?1, updated_at = ?2",
                params![if completed { 1 } else { 0 }, unix_now()],
            )?;
            Ok(updated)
        })
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound(id));
            }
            tracing::debug!(id, "deleted todo");
            Ok(())
        })
    }

    pub fn delete_completed(&self) -> Result<usize> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM todos WHERE completed = 1", [])?;
            Ok(deleted)
        })
    }

    /// Drops every todo and restarts id assignment at 1.
    pub fn reset(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM todos", [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'todos'", [])?;
        tx.commit()?;
        tracing::info!("todo store reset");
        Ok(())
    }
}

pub fn init(storage: &StorageOptions) -> anyhow::Result<StorageHandle> {
    let db_path = &storage.database_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage).context("configuring sqlite connection")?;
    schema::apply(&conn).context("applying schema migrations")?;
    tracing::info!(path = %db_path.display(), "todo store ready");
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(storage.busy_timeout_ms))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )?;
    Ok(())
}

fn normalize_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("todo text cannot be empty"));
    }
    Ok(trimmed)
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<TodoRecord> {
    Ok(TodoRecord {
        id: row.get(0)?,
        text: row.get(1)?,
        completed: row.get::<_, i64>(2)? != 0,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    pub(crate) fn init_storage() -> anyhow::Result<(TempDir, StorageHandle)> {
        let temp = TempDir::new()?;
        let options = StorageOptions {
            database_path: temp.path().join("data").join("todos.db"),
            ..StorageOptions::default()
        };
        let storage = init(&options)?;
        Ok((temp, storage))
    }

    #[test]
    fn init_creates_the_database_file() -> anyhow::Result<()> {
        let (temp, storage) = init_storage()?;
        assert_eq!(storage.database_path(), temp.path().join("data").join("todos.db"));
        assert!(storage.database_path().exists());
        Ok(())
    }

    fn texts(todos: &[TodoRecord]) -> Vec<&str> {
        todos.iter().map(|todo| todo.text.as_str()).collect()
    }

    #[test]
    fn create_trims_text_and_starts_active() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let todo = storage.create("  buy milk  ")?;
        assert_eq!(todo.text, "buy milk");
        assert!(!todo.completed);
        assert_eq!(storage.get(todo.id)?, todo);
        Ok(())
    }

    #[test]
    fn create_rejects_blank_text() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        assert_matches!(storage.create("   "), Err(StoreError::Validation(_)));
        assert!(storage.list()?.is_empty());
        Ok(())
    }

    #[test]
    fn list_is_in_creation_order() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        for text in ["one", "two", "three"] {
            storage.create(text)?;
        }
        assert_eq!(texts(&storage.list()?), vec!["one", "two", "three"]);
        Ok(())
    }

    #[test]
    fn list_by_status_splits_the_set() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let one = storage.create("one")?;
        storage.create("two")?;
        let three = storage.create("three")?;
        storage.set_status(one.id, true)?;
        storage.set_status(three.id, true)?;

        assert_eq!(texts(&storage.list_by_status(true)?), vec!["one", "three"]);
        assert_eq!(texts(&storage.list_by_status(false)?), vec!["two"]);
        Ok(())
    }

    #[test]
    fn missing_ids_report_not_found() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        assert_matches!(storage.get(42), Err(StoreError::NotFound(42)));
        assert_matches!(storage.update_text(42, "x"), Err(StoreError::NotFound(42)));
        assert_matches!(storage.set_status(42, true), Err(StoreError::NotFound(42)));
        assert_matches!(storage.toggle_status(42), Err(StoreError::NotFound(42)));
        assert_matches!(storage.delete(42), Err(StoreError::NotFound(42)));
        Ok(())
    }

    #[test]
    fn update_text_trims_and_rejects_blank() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let todo = storage.create("feed the cat")?;
        let updated = storage.update_text(todo.id, "  feed the dog ")?;
        assert_eq!(updated.text, "feed the dog");
        assert_eq!(updated.id, todo.id);
        assert_matches!(
            storage.update_text(todo.id, " "),
            Err(StoreError::Validation(_))
        );
        assert_eq!(storage.get(todo.id)?.text, "feed the dog");
        Ok(())
    }

    #[test]
    fn toggling_twice_restores_status_and_leaves_others_alone() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let one = storage.create("one")?;
        let two = storage.set_status(storage.create("two")?.id, true)?;

        assert!(storage.toggle_status(one.id)?.completed);
        assert!(!storage.toggle_status(one.id)?.completed);

        let after = storage.list()?;
        assert_eq!(after[0].text, one.text);
        assert!(!after[0].completed);
        assert_eq!(after[1].id, two.id);
        assert!(after[1].completed);
        Ok(())
    }

    #[test]
    fn set_all_status_round_trips() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        assert_eq!(storage.set_all_status(true)?, 0);

        storage.create("one")?;
        let two = storage.create("two")?;
        storage.set_status(two.id, true)?;

        assert_eq!(storage.set_all_status(true)?, 2);
        assert!(storage.list()?.iter().all(|todo| todo.completed));
        storage.set_all_status(false)?;
        assert!(storage.list()?.iter().all(|todo| !todo.completed));
        Ok(())
    }

    #[test]
    fn delete_completed_keeps_active_items_intact() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let one = storage.create("one")?;
        let two = storage.create("two")?;
        let three = storage.create("three")?;
        storage.set_status(two.id, true)?;

        assert_eq!(storage.delete_completed()?, 1);
        assert_eq!(storage.list()?, vec![one, three]);
        assert_eq!(storage.delete_completed()?, 0);
        Ok(())
    }

    #[test]
    fn ids_are_not_reused_after_delete() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.create("one")?;
        let two = storage.create("two")?;
        storage.delete(two.id)?;
        let three = storage.create("three")?;
        assert!(three.id > two.id);
        assert_matches!(storage.get(two.id), Err(StoreError::NotFound(_)));
        Ok(())
    }

    #[test]
    fn reset_clears_items_and_restarts_ids() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.create("one")?;
        storage.create("two")?;
        storage.reset()?;
        assert!(storage.list()?.is_empty());
        assert_eq!(storage.create("fresh")?.id, 1);
        Ok(())
    }
}
