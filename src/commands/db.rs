use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::util::{ensure_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "1.0.0";

pub fn open_read_write(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }
    let connection = Connection::open(path)
        .with_context(|| format!("failed to open database: {}", path.display()))?;
    configure_connection(&connection)?;
    Ok(connection)
}

pub fn open_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", path.display()))
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
              id INTEGER PRIMARY KEY,
              word TEXT NOT NULL,
              pos TEXT NOT NULL DEFAULT '',
              definition TEXT NOT NULL,
              page INTEGER,
              column_index INTEGER,
              alias TEXT,
              inflection TEXT
            );

            CREATE TABLE IF NOT EXISTS refs (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              source_id INTEGER NOT NULL,
              type TEXT NOT NULL CHECK (type IN ('see', 'seealso')),
              target_word TEXT NOT NULL,
              target_id INTEGER,
              FOREIGN KEY(source_id) REFERENCES entries(id) ON DELETE CASCADE,
              FOREIGN KEY(target_id) REFERENCES entries(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_word ON entries(word COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_refs_source ON refs(source_id);
            CREATE INDEX IF NOT EXISTS idx_refs_target ON refs(target_id);
            ",
        )
        .context("failed to create dictionary tables")?;

    connection
        .execute(
            "
            CREATE VIRTUAL TABLE IF NOT EXISTS entries_fts
            USING fts5(word, definition, content='entries', content_rowid='id')
            ",
            [],
        )
        .context("failed to initialize FTS5 table entries_fts")?;

    upsert_metadata(connection, "db_schema_version", DB_SCHEMA_VERSION)?;
    Ok(())
}

pub fn upsert_metadata(connection: &Connection, key: &str, value: &str) -> Result<()> {
    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )
        .with_context(|| format!("failed to write metadata key {key}"))?;
    Ok(())
}

pub fn touch_updated_at(connection: &Connection) -> Result<()> {
    upsert_metadata(connection, "db_updated_at", &now_utc_string())
}

pub fn read_metadata(connection: &Connection, key: &str) -> Result<Option<String>> {
    connection
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read metadata key {key}"))
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent_and_records_version() {
        let connection = Connection::open_in_memory().expect("in-memory db");
        ensure_schema(&connection).expect("first schema pass");
        ensure_schema(&connection).expect("second schema pass");

        assert_eq!(
            read_metadata(&connection, "db_schema_version").expect("metadata"),
            Some(DB_SCHEMA_VERSION.to_string())
        );
        assert_eq!(read_metadata(&connection, "missing").expect("metadata"), None);
        assert_eq!(count_rows(&connection, "SELECT COUNT(*) FROM entries").expect("count"), 0);
    }
}
