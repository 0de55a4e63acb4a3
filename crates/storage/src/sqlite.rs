//! `SQLite` backend: one database file per origin, shared by every process
//! that opens it. Writes are mirrored into an append-only change log so other
//! processes can replay them as notifications.

use std::path::Path;
use std::str::FromStr as _;

use chrono::{Duration, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension as _};

use crate::backend::{ChangeRecord, ContextId, DurableBackend, StorageEvent};
use crate::error::StorageError;
use crate::migrations;

/// Change-log rows older than this are pruned when an origin is opened.
const CHANGE_LOG_RETENTION_HOURS: i64 = 24;

/// Maximum change-log rows returned by one poll.
const CHANGE_BATCH_LIMIT: i64 = 500;

type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Durable backend wrapping a `SQLite` connection pool.
#[derive(Clone, Debug)]
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
}

fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 5000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )
}

impl SqliteBackend {
    /// Open (or create) the origin database at `db_path`.
    ///
    /// # Errors
    /// Returns error if the pool cannot be built or migrations fail.
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
        let pool = Pool::builder().max_size(4).build(manager)?;

        let conn = pool.get()?;
        migrations::run_migrations(&conn).map_err(|e| StorageError::Migration(e.to_string()))?;
        let pruned = prune_change_log(&conn, Duration::hours(CHANGE_LOG_RETENTION_HOURS))?;
        drop(conn);

        tracing::info!(path = %db_path.display(), pruned, "Origin storage opened");
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConn, StorageError> {
        Ok(self.pool.get()?)
    }
}

fn prune_change_log(conn: &Connection, retention: Duration) -> Result<usize, StorageError> {
    let cutoff = (Utc::now() - retention).to_rfc3339();
    Ok(conn.execute("DELETE FROM kv_changes WHERE changed_at < ?1", params![cutoff])?)
}

impl DurableBackend for SqliteBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str, context: &ContextId) -> Result<(), StorageError> {
        let mut conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        tx.execute(
            "INSERT INTO kv_changes (key, value, context_id, changed_at) VALUES (?1, ?2, ?3, ?4)",
            params![key, value, context.to_string(), now],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str, context: &ContextId) -> Result<bool, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        if deleted > 0 {
            tx.execute(
                "INSERT INTO kv_changes (key, value, context_id, changed_at) VALUES (?1, NULL, ?2, ?3)",
                params![key, context.to_string(), Utc::now().to_rfc3339()],
            )?;
        }
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn changes_since(&self, seq: u64) -> Result<Vec<ChangeRecord>, StorageError> {
        let conn = self.conn()?;
        let after = i64::try_from(seq).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(
            "SELECT seq, key, value, context_id FROM kv_changes
             WHERE seq > ?1 ORDER BY seq LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![after, CHANGE_BATCH_LIMIT], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (seq, key, new_value, context_id) = row?;
            let Ok(origin) = ContextId::from_str(&context_id) else {
                tracing::warn!(seq, context_id = %context_id, "Skipping change with malformed context id");
                continue;
            };
            records.push(ChangeRecord {
                seq: u64::try_from(seq).unwrap_or_default(),
                event: StorageEvent { key, new_value, origin },
            });
        }
        Ok(records)
    }

    fn latest_change(&self) -> Result<u64, StorageError> {
        let conn = self.conn()?;
        let seq: Option<i64> =
            conn.query_row("SELECT MAX(seq) FROM kv_changes", [], |row| row.get(0))?;
        Ok(seq.and_then(|s| u64::try_from(s).ok()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn create_test_backend() -> (SqliteBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = SqliteBackend::open(&temp_dir.path().join("origin.db")).unwrap();
        (backend, temp_dir)
    }

    #[test]
    fn test_write_and_read() {
        let (backend, _temp_dir) = create_test_backend();
        let ctx = ContextId::new();
        backend.write("quizlink:a", "1", &ctx).unwrap();
        backend.write("quizlink:a", "2", &ctx).unwrap();
        assert_eq!(backend.read("quizlink:a").unwrap().as_deref(), Some("2"));
        assert_eq!(backend.read("quizlink:missing").unwrap(), None);
    }

    #[test]
    fn test_change_log_records_writes_and_removals() {
        let (backend, _temp_dir) = create_test_backend();
        let ctx = ContextId::new();
        let start = backend.latest_change().unwrap();

        backend.write("k", "\"v\"", &ctx).unwrap();
        assert!(backend.remove("k", &ctx).unwrap());
        assert!(!backend.remove("k", &ctx).unwrap());

        let changes = backend.changes_since(start).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].event.new_value.as_deref(), Some("\"v\""));
        assert_eq!(changes[0].event.origin, ctx);
        assert_eq!(changes[1].event.new_value, None);
        assert!(changes[0].seq < changes[1].seq);
        assert_eq!(backend.latest_change().unwrap(), changes[1].seq);
        assert!(backend.changes_since(changes[1].seq).unwrap().is_empty());
    }

    #[test]
    fn test_keys_with_prefix_is_literal() {
        let (backend, _temp_dir) = create_test_backend();
        let ctx = ContextId::new();
        for key in ["ns_1:a", "ns_1:b", "nsX1:c"] {
            backend.write(key, "x", &ctx).unwrap();
        }
        assert_eq!(backend.keys_with_prefix("ns_1:").unwrap(), vec!["ns_1:a", "ns_1:b"]);
    }

    #[test]
    fn test_reopen_keeps_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("origin.db");
        let ctx = ContextId::new();
        SqliteBackend::open(&path).unwrap().write("k", "42", &ctx).unwrap();
        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.read("k").unwrap().as_deref(), Some("42"));
    }
}
