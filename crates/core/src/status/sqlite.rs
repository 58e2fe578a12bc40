//! SQLite-backed status store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{JobStatus, StatusEntry, StatusError, StatusStore};
use crate::db;

/// Status store backed by the `job_status` table.
pub struct SqliteStatusStore {
    conn: Mutex<Connection>,
}

impl SqliteStatusStore {
    /// Open (or create) the status table in the database file at `path`.
    pub fn new(path: &Path, busy_timeout: Duration) -> Result<Self, StatusError> {
        let conn = db::open_connection(path, busy_timeout)
            .map_err(|e| StatusError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory status store (useful for testing).
    pub fn in_memory() -> Result<Self, StatusError> {
        let conn = db::open_in_memory().map_err(|e| StatusError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StatusError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS job_status (
                ticket TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                detail TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_job_status_status
                ON job_status(status, updated_at);
            "#,
        )
        .map_err(|e| StatusError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StatusError> {
        self.conn
            .lock()
            .map_err(|_| StatusError::Database("status connection lock poisoned".to_string()))
    }

    fn row_to_entry(
        row: &rusqlite::Row,
    ) -> rusqlite::Result<(String, String, Option<String>, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn into_entry(
        (ticket, status, detail, updated_at): (String, String, Option<String>, String),
    ) -> Result<StatusEntry, StatusError> {
        Ok(StatusEntry {
            ticket,
            status: status.parse()?,
            detail,
            updated_at: db::parse_timestamp(&updated_at),
        })
    }
}

impl StatusStore for SqliteStatusStore {
    fn set_status(
        &self,
        ticket: &str,
        status: JobStatus,
        detail: Option<&str>,
    ) -> Result<(), StatusError> {
        let conn = self.lock()?;
        let now = db::format_timestamp(Utc::now());
        conn.execute(
            r#"
            INSERT INTO job_status (ticket, status, detail, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(ticket) DO UPDATE SET
                status = excluded.status,
                detail = excluded.detail,
                updated_at = excluded.updated_at
            "#,
            params![ticket, status.as_str(), detail, now],
        )
        .map_err(|e| StatusError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_status(&self, ticket: &str) -> Result<Option<StatusEntry>, StatusError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT ticket, status, detail, updated_at FROM job_status WHERE ticket = ?1",
                params![ticket],
                Self::row_to_entry,
            )
            .optional()
            .map_err(|e| StatusError::Database(e.to_string()))?;

        row.map(Self::into_entry).transpose()
    }

    fn begin_running(&self, ticket: &str) -> Result<bool, StatusError> {
        let conn = self.lock()?;
        let now = db::format_timestamp(Utc::now());
        let changed = conn
            .execute(
                r#"
                UPDATE job_status
                SET status = 'RUNNING', detail = NULL, updated_at = ?1
                WHERE ticket = ?2 AND status = 'PENDING'
                "#,
                params![now, ticket],
            )
            .map_err(|e| StatusError::Database(e.to_string()))?;
        Ok(changed == 1)
    }

    fn fail_stale_running(
        &self,
        older_than: DateTime<Utc>,
        detail: &str,
    ) -> Result<Vec<String>, StatusError> {
        let conn = self.lock()?;
        let now = db::format_timestamp(Utc::now());
        let mut stmt = conn
            .prepare(
                r#"
                UPDATE job_status
                SET status = 'ERROR', detail = ?1, updated_at = ?2
                WHERE status = 'RUNNING' AND updated_at < ?3
                RETURNING ticket
                "#,
            )
            .map_err(|e| StatusError::Database(e.to_string()))?;

        let tickets = stmt
            .query_map(
                params![detail, now, db::format_timestamp(older_than)],
                |row| row.get(0),
            )
            .map_err(|e| StatusError::Database(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| StatusError::Database(e.to_string()))?;

        Ok(tickets)
    }

    fn count_by_status(&self, status: JobStatus) -> Result<usize, StatusError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM job_status WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| StatusError::Database(e.to_string()))?;
        Ok(count as usize)
    }
}
