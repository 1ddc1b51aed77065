//! Database-backed status-check storage.
//!
//! Same shape as the rest of our persistence: WAL-mode SQLite behind a
//! parking_lot mutex, schema applied on open.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::sync::Arc;
use tracing::info;

use crate::models::StatusCheck;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS status_checks (
    id TEXT PRIMARY KEY,
    client_name TEXT NOT NULL,
    timestamp TEXT NOT NULL
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_status_checks_timestamp
    ON status_checks(timestamp DESC);
"#;

pub struct StatusStore {
    conn: Arc<Mutex<Connection>>,
}

impl StatusStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to apply status schema")?;

        info!("Status store ready at {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn insert_status(&self, check: &StatusCheck) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO status_checks (id, client_name, timestamp) VALUES (?1, ?2, ?3)",
            params![check.id, check.client_name, check.timestamp.to_rfc3339()],
        )
        .context("Failed to insert status check")?;
        Ok(())
    }

    pub fn recent_statuses(&self, limit: usize) -> Result<Vec<StatusCheck>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, client_name, timestamp FROM status_checks
             ORDER BY timestamp DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut checks = Vec::new();
        for row in rows {
            let (id, client_name, timestamp) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .with_context(|| format!("Corrupt timestamp on status check {}", id))?
                .with_timezone(&Utc);
            checks.push(StatusCheck {
                id,
                client_name,
                timestamp,
            });
        }

        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, StatusStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.db");
        let store = StatusStore::new(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn round_trips_status_checks() {
        let (_dir, store) = temp_store();

        let check = StatusCheck::new("monitor-1".to_string());
        store.insert_status(&check).unwrap();

        let recent = store.recent_statuses(1000).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, check.id);
        assert_eq!(recent[0].client_name, "monitor-1");
        assert_eq!(recent[0].timestamp, check.timestamp);
    }

    #[test]
    fn recent_statuses_respects_limit() {
        let (_dir, store) = temp_store();

        for i in 0..5 {
            store
                .insert_status(&StatusCheck::new(format!("client-{}", i)))
                .unwrap();
        }

        assert_eq!(store.recent_statuses(3).unwrap().len(), 3);
        assert_eq!(store.recent_statuses(1000).unwrap().len(), 5);
    }
}
