//! SQLite-backed store
//!
//! Rows live in two tables. Every `apply` runs inside one `IMMEDIATE` transaction: each
//! shifted row is updated only if it still sits where the planner saw it, and the first
//! row that does not match rolls the whole batch back.
//!
//! # Schema
//!
//! - `containers`: (id, kind, name)
//! - `items`: (id, container_id, kind, title, position, updated_at)

use super::{stale, OrderingStore};
use crate::error::{OrderingError, Result};
use crate::plan::{Placement, ReorderPlan};
use crate::types::{Container, ContainerId, ContainerKind, Item, ItemId, ItemKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

const ITEM_COLUMNS: &str = "id, container_id, kind, title, position, updated_at";

impl ToSql for ContainerKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ContainerKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for ItemKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ItemKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let updated_ms: i64 = row.get(5)?;
    Ok(Item {
        id: ItemId::from_string(row.get::<_, String>(0)?),
        container_id: ContainerId::from_string(row.get::<_, String>(1)?),
        kind: row.get(2)?,
        title: row.get(3)?,
        position: row.get(4)?,
        updated_at: DateTime::<Utc>::from_timestamp_millis(updated_ms).unwrap_or_default(),
    })
}

fn container_from_row(row: &Row<'_>) -> rusqlite::Result<Container> {
    Ok(Container {
        id: ContainerId::from_string(row.get::<_, String>(0)?),
        kind: row.get(1)?,
        name: row.get(2)?,
    })
}

/// Store backed by a SQLite database file (or an in-memory database)
///
/// The connection sits behind a mutex and every call runs on the blocking pool, so the
/// store is `Send + Sync` and never stalls the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;

        // WAL lets readers proceed while a reorder transaction is open
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened ordering database");

        Self::init(conn, Some(path))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS containers (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                container_id TEXT NOT NULL REFERENCES containers(id),
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                position INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_container_position
                ON items(container_id, position);
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file path, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut *guard)
        })
        .await
        .map_err(|e| OrderingError::Io(std::io::Error::other(e)))?
    }
}

fn container_exists(conn: &Connection, id: &ContainerId) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM containers WHERE id = ?1",
            [id.as_str()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn stored_position(conn: &Connection, item: &ItemId) -> Result<Option<usize>> {
    Ok(conn
        .query_row(
            "SELECT position FROM items WHERE id = ?1",
            [item.as_str()],
            |row| row.get(0),
        )
        .optional()?)
}

fn apply_plan(conn: &mut Connection, plan: &ReorderPlan) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = Utc::now().timestamp_millis();

    for shift in &plan.shifts {
        let changed = tx.execute(
            "UPDATE items SET position = ?1, updated_at = ?2
             WHERE id = ?3 AND container_id = ?4 AND position = ?5",
            params![
                shift.to as i64,
                now,
                shift.item.as_str(),
                shift.container.as_str(),
                shift.from as i64
            ],
        )?;
        if changed != 1 {
            // Dropping the transaction rolls back every shift already written
            return Err(stale(
                &shift.item,
                shift.from,
                stored_position(&tx, &shift.item)?,
            ));
        }
    }

    match &plan.placement {
        Some(Placement::Insert { item }) => {
            if !container_exists(&tx, &item.container_id)? {
                return Err(OrderingError::container_not_found(&item.container_id));
            }
            if stored_position(&tx, &item.id)?.is_some() {
                return Err(OrderingError::duplicate_id(
                    item.kind.as_str(),
                    item.id.as_str(),
                ));
            }
            let count: usize = tx.query_row(
                "SELECT COUNT(*) FROM items WHERE container_id = ?1",
                [item.container_id.as_str()],
                |row| row.get(0),
            )?;
            if count != item.position {
                return Err(stale(&item.id, item.position, Some(count)));
            }
            tx.execute(
                "INSERT INTO items (id, container_id, kind, title, position, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    item.id.as_str(),
                    item.container_id.as_str(),
                    item.kind,
                    item.title,
                    item.position as i64,
                    now
                ],
            )?;
        }
        Some(Placement::Move {
            item,
            from_container,
            from,
            to_container,
            to,
        }) => {
            if !container_exists(&tx, to_container)? {
                return Err(OrderingError::container_not_found(to_container));
            }
            let changed = tx.execute(
                "UPDATE items SET container_id = ?1, position = ?2, updated_at = ?3
                 WHERE id = ?4 AND container_id = ?5 AND position = ?6",
                params![
                    to_container.as_str(),
                    *to as i64,
                    now,
                    item.as_str(),
                    from_container.as_str(),
                    *from as i64
                ],
            )?;
            if changed != 1 {
                return Err(stale(item, *from, stored_position(&tx, item)?));
            }
        }
        Some(Placement::Remove {
            item,
            container,
            position,
        }) => {
            let changed = tx.execute(
                "DELETE FROM items WHERE id = ?1 AND container_id = ?2 AND position = ?3",
                params![item.as_str(), container.as_str(), *position as i64],
            )?;
            if changed != 1 {
                return Err(stale(item, *position, stored_position(&tx, item)?));
            }
        }
        None => {}
    }

    tx.commit()?;
    Ok(())
}

#[async_trait]
impl OrderingStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn create_container(&self, container: &Container) -> Result<()> {
        let container = container.clone();
        self.with_conn(move |conn| {
            if container_exists(conn, &container.id)? {
                return Err(OrderingError::duplicate_id(
                    container.kind.as_str(),
                    container.id.as_str(),
                ));
            }
            conn.execute(
                "INSERT INTO containers (id, kind, name) VALUES (?1, ?2, ?3)",
                params![container.id.as_str(), container.kind, container.name],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_container(&self, id: &ContainerId) -> Result<Container> {
        let id = id.clone();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, kind, name FROM containers WHERE id = ?1",
                [id.as_str()],
                container_from_row,
            )
            .optional()?
            .ok_or_else(|| OrderingError::container_not_found(&id))
        })
        .await
    }

    async fn list_containers(&self) -> Result<Vec<Container>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT id, kind, name FROM containers ORDER BY id")?;
            let rows = stmt.query_map([], container_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn list_items(&self, container: &ContainerId) -> Result<Vec<Item>> {
        let container = container.clone();
        self.with_conn(move |conn| {
            if !container_exists(conn, &container)? {
                return Err(OrderingError::container_not_found(&container));
            }
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE container_id = ?1 ORDER BY position, id"
            ))?;
            let rows = stmt.query_map([container.as_str()], item_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn get_item(&self, id: &ItemId) -> Result<Item> {
        let id = id.clone();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                [id.as_str()],
                item_from_row,
            )
            .optional()?
            .ok_or_else(|| OrderingError::item_not_found(&id))
        })
        .await
    }

    async fn apply(&self, plan: &ReorderPlan) -> Result<()> {
        let plan = plan.clone();
        let writes = plan.writes();
        self.with_conn(move |conn| apply_plan(conn, &plan)).await?;
        tracing::trace!(writes, "sqlite plan committed");
        Ok(())
    }
}
