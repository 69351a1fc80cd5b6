//! Database schema migrations for takt.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0))
        .unwrap_or_else(|e| {
            if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                tracing::warn!("failed to read schema_version: {e}");
            }
            0
        })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: habits, entries, chains, chain items and the kv table.
///
/// Entries follow their habit on delete. Chain items follow their chain and
/// lose their habit reference when the habit goes away.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS habits (
            id                    TEXT PRIMARY KEY,
            name                  TEXT NOT NULL,
            emoji                 TEXT NOT NULL DEFAULT '',
            created_at            TEXT NOT NULL,
            is_favorite           INTEGER NOT NULL DEFAULT 0,
            default_duration_secs INTEGER NOT NULL DEFAULT 60,
            archived_at           TEXT
        );

        CREATE TABLE IF NOT EXISTS habit_entries (
            id            TEXT PRIMARY KEY,
            habit_id      TEXT REFERENCES habits(id) ON DELETE CASCADE,
            performed_at  TEXT NOT NULL,
            duration_secs INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chains (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            color_name  TEXT NOT NULL DEFAULT 'blue',
            created_at  TEXT NOT NULL,
            archived_at TEXT
        );

        CREATE TABLE IF NOT EXISTS chain_items (
            id         TEXT PRIMARY KEY,
            item_order INTEGER NOT NULL,
            habit_id   TEXT REFERENCES habits(id) ON DELETE SET NULL,
            chain_id   TEXT REFERENCES chains(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entries_habit_performed ON habit_entries(habit_id, performed_at);
        CREATE INDEX IF NOT EXISTS idx_chain_items_chain_order ON chain_items(chain_id, item_order);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: habit notes, manual ordering and pack provenance.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE habits ADD COLUMN notes TEXT;
         ALTER TABLE habits ADD COLUMN sort_order INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE habits ADD COLUMN source_pack_id TEXT;
         CREATE INDEX IF NOT EXISTS idx_habits_active_order ON habits(archived_at, sort_order, created_at);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
