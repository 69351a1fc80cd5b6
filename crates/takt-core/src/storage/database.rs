//! SQLite-backed [`EventStore`].
//!
//! Timestamps are stored as fixed-width RFC 3339 text in UTC so that string
//! ordering matches time ordering. Ids are stored as hyphenated UUID text.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::data_dir;
use super::event_store::{EventStore, StoreResult};
use super::migrations;
use crate::error::{CoreError, DatabaseError, StoreError};
use crate::model::{Chain, ChainItem, Habit, HabitEntry};

const HABIT_COLUMNS: &str =
    "id, name, emoji, created_at, is_favorite, default_duration_secs, archived_at, notes, sort_order, source_pack_id";
const CHAIN_COLUMNS: &str = "id, name, color_name, created_at, archived_at";

/// SQLite database holding habits, entries, chains and the kv table.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/takt.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("takt.db");
        Ok(Self::open_at(path)?)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        tracing::debug!(version = migrations::get_schema_version(&conn), "database ready");
        Ok(Self { conn })
    }

    fn query_habits(&self, clause: &str) -> StoreResult<Vec<Habit>> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits {clause}");
        reading(|| {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([], habit_from_row)?;
            rows.collect()
        })
    }

    fn query_entries(&self, clause: &str, habit_id: Option<Uuid>) -> StoreResult<Vec<HabitEntry>> {
        let sql = format!("SELECT id, habit_id, performed_at, duration_secs FROM habit_entries {clause}");
        reading(|| {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = match habit_id {
                Some(id) => stmt.query_map(params![id.to_string()], entry_from_row)?,
                None => stmt.query_map([], entry_from_row)?,
            };
            rows.collect()
        })
    }
}

/// Run a query that only reads; failures other than corruption become `ReadFailed`.
fn reading<T>(query: impl FnOnce() -> rusqlite::Result<T>) -> StoreResult<T> {
    query().map_err(StoreError::from_read)
}

fn fmt_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(idx, e))
}

fn opt_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| Uuid::parse_str(&t).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn opt_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        DateTime::parse_from_rfc3339(&t)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        emoji: row.get(2)?,
        created_at: time_at(row, 3)?,
        is_favorite: row.get(4)?,
        default_duration_secs: row.get(5)?,
        archived_at: opt_time_at(row, 6)?,
        notes: row.get(7)?,
        sort_order: row.get(8)?,
        source_pack_id: row.get(9)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<HabitEntry> {
    Ok(HabitEntry {
        id: uuid_at(row, 0)?,
        habit_id: opt_uuid_at(row, 1)?,
        performed_at: time_at(row, 2)?,
        duration_secs: row.get(3)?,
    })
}

fn chain_from_row(row: &Row<'_>) -> rusqlite::Result<Chain> {
    Ok(Chain {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        color_name: row.get(2)?,
        created_at: time_at(row, 3)?,
        archived_at: opt_time_at(row, 4)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ChainItem> {
    Ok(ChainItem {
        id: uuid_at(row, 0)?,
        order: row.get(1)?,
        habit_id: opt_uuid_at(row, 2)?,
        chain_id: opt_uuid_at(row, 3)?,
    })
}

impl EventStore for Database {
    fn insert_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        self.conn.execute(
            &format!("INSERT INTO habits ({HABIT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                habit.id.to_string(),
                habit.name,
                habit.emoji,
                fmt_time(&habit.created_at),
                habit.is_favorite,
                habit.default_duration_secs,
                habit.archived_at.as_ref().map(fmt_time),
                habit.notes,
                habit.sort_order,
                habit.source_pack_id,
            ],
        )?;
        Ok(())
    }

    fn update_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE habits SET name = ?2, emoji = ?3, is_favorite = ?4, default_duration_secs = ?5,
                    archived_at = ?6, notes = ?7, sort_order = ?8, source_pack_id = ?9
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.name,
                habit.emoji,
                habit.is_favorite,
                habit.default_duration_secs,
                habit.archived_at.as_ref().map(fmt_time),
                habit.notes,
                habit.sort_order,
                habit.source_pack_id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound { kind: "habit", id: habit.id.to_string() });
        }
        Ok(())
    }

    fn delete_habit(&mut self, id: Uuid) -> StoreResult<()> {
        self.conn.execute("DELETE FROM habits WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    fn habit(&self, id: Uuid) -> StoreResult<Option<Habit>> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1");
        reading(|| {
            self.conn
                .query_row(&sql, params![id.to_string()], habit_from_row)
                .optional()
        })
    }

    fn active_habits(&self) -> StoreResult<Vec<Habit>> {
        self.query_habits("WHERE archived_at IS NULL ORDER BY sort_order ASC, created_at DESC")
    }

    fn archived_habits(&self) -> StoreResult<Vec<Habit>> {
        self.query_habits("WHERE archived_at IS NOT NULL ORDER BY archived_at DESC")
    }

    fn favorite_habits(&self) -> StoreResult<Vec<Habit>> {
        self.query_habits("WHERE archived_at IS NULL AND is_favorite = 1 ORDER BY created_at DESC")
    }

    fn habits_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Habit>> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1");
        reading(|| {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut habits = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(habit) = stmt.query_row(params![id.to_string()], habit_from_row).optional()? {
                    if !habits.iter().any(|h: &Habit| h.id == habit.id) {
                        habits.push(habit);
                    }
                }
            }
            Ok(habits)
        })
    }

    fn insert_entry(&mut self, entry: &HabitEntry) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO habit_entries (id, habit_id, performed_at, duration_secs) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id.to_string(),
                entry.habit_id.map(|id| id.to_string()),
                fmt_time(&entry.performed_at),
                entry.duration_secs,
            ],
        )?;
        Ok(())
    }

    fn entries_for_habit(&self, habit_id: Uuid) -> StoreResult<Vec<HabitEntry>> {
        self.query_entries("WHERE habit_id = ?1 ORDER BY performed_at ASC", Some(habit_id))
    }

    fn all_entries(&self) -> StoreResult<Vec<HabitEntry>> {
        self.query_entries("ORDER BY performed_at ASC", None)
    }

    fn insert_chain(&mut self, chain: &Chain) -> StoreResult<()> {
        self.conn.execute(
            &format!("INSERT INTO chains ({CHAIN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![
                chain.id.to_string(),
                chain.name,
                chain.color_name,
                fmt_time(&chain.created_at),
                chain.archived_at.as_ref().map(fmt_time),
            ],
        )?;
        Ok(())
    }

    fn update_chain(&mut self, chain: &Chain) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE chains SET name = ?2, color_name = ?3, archived_at = ?4 WHERE id = ?1",
            params![
                chain.id.to_string(),
                chain.name,
                chain.color_name,
                chain.archived_at.as_ref().map(fmt_time),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound { kind: "chain", id: chain.id.to_string() });
        }
        Ok(())
    }

    fn delete_chain(&mut self, id: Uuid) -> StoreResult<()> {
        self.conn.execute("DELETE FROM chains WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    fn chain(&self, id: Uuid) -> StoreResult<Option<Chain>> {
        let sql = format!("SELECT {CHAIN_COLUMNS} FROM chains WHERE id = ?1");
        reading(|| {
            self.conn
                .query_row(&sql, params![id.to_string()], chain_from_row)
                .optional()
        })
    }

    fn active_chains(&self) -> StoreResult<Vec<Chain>> {
        let sql = format!("SELECT {CHAIN_COLUMNS} FROM chains WHERE archived_at IS NULL ORDER BY created_at DESC");
        reading(|| {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([], chain_from_row)?;
            rows.collect()
        })
    }

    fn chain_items(&self, chain_id: Uuid) -> StoreResult<Vec<ChainItem>> {
        reading(|| {
            let mut stmt = self.conn.prepare(
                "SELECT id, item_order, habit_id, chain_id FROM chain_items
                 WHERE chain_id = ?1 ORDER BY item_order ASC",
            )?;
            let rows = stmt.query_map(params![chain_id.to_string()], item_from_row)?;
            rows.collect()
        })
    }

    fn replace_chain_items(&mut self, chain_id: Uuid, habit_ids: &[Uuid]) -> StoreResult<Vec<ChainItem>> {
        if self.chain(chain_id)?.is_none() {
            return Err(StoreError::NotFound { kind: "chain", id: chain_id.to_string() });
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM chain_items WHERE chain_id = ?1", params![chain_id.to_string()])?;

        let mut created = Vec::with_capacity(habit_ids.len());
        for (order, habit_id) in habit_ids.iter().enumerate() {
            let item = ChainItem::new(chain_id, order as i32, Some(*habit_id));
            tx.execute(
                "INSERT INTO chain_items (id, item_order, habit_id, chain_id) VALUES (?1, ?2, ?3, ?4)",
                params![item.id.to_string(), item.order, habit_id.to_string(), chain_id.to_string()],
            )?;
            created.push(item);
        }
        tx.commit()?;
        Ok(created)
    }

    fn kv_get(&self, key: &str) -> StoreResult<Option<String>> {
        reading(|| {
            self.conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get::<_, String>(0))
                .optional()
        })
    }

    fn kv_set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_delete(&mut self, key: &str) -> StoreResult<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
