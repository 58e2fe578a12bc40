//! SQLite-backed pending queue.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use super::{PendingQueue, QueueError};
use crate::db;

/// Pending queue stored in the `pending_queue` table.
pub struct SqlitePendingQueue {
    conn: Mutex<Connection>,
}

impl SqlitePendingQueue {
    /// Open (or create) the queue in the database file at `path`.
    pub fn new(path: &Path, busy_timeout: Duration) -> Result<Self, QueueError> {
        let conn = db::open_connection(path, busy_timeout)
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory queue (useful for testing).
    pub fn in_memory() -> Result<Self, QueueError> {
        let conn = db::open_in_memory().map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pending_queue (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket TEXT NOT NULL,
                ordering_key INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pending_queue_order
                ON pending_queue(ordering_key, seq);
            "#,
        )
        .map_err(|e| QueueError::Unavailable(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, QueueError> {
        self.conn
            .lock()
            .map_err(|_| QueueError::Unavailable("queue connection lock poisoned".to_string()))
    }
}

impl PendingQueue for SqlitePendingQueue {
    fn enqueue(&self, ticket: &str, ordering_key: i64) -> Result<(), QueueError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO pending_queue (ticket, ordering_key) VALUES (?1, ?2)",
            params![ticket, ordering_key],
        )
        .map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn claim_next(&self) -> Result<Option<String>, QueueError> {
        let conn = self.lock()?;
        // Selection and removal are one statement; SQLite serializes writers
        // across processes, so a row can only be deleted (and returned) once.
        conn.query_row(
            r#"
            DELETE FROM pending_queue
            WHERE seq = (
                SELECT seq FROM pending_queue
                ORDER BY ordering_key ASC, seq ASC
                LIMIT 1
            )
            RETURNING ticket
            "#,
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| QueueError::Unavailable(e.to_string()))
    }

    fn len(&self) -> Result<usize, QueueError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pending_queue", [], |row| row.get(0))
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Ok(count as usize)
    }
}
