//! SQLite-backed session store.
//!
//! One row per block: id, type, start, and (once closed) end timestamp.
//! Timestamps are RFC 3339 strings; ordering and date math happen on the
//! parsed values, not in SQL.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, Result, StoreError};
use crate::services::SessionStore;
use crate::session::Session;
use crate::timer::BlockType;

pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    /// Open the store at `~/.config/lockwork/sessions.db`, creating the
    /// schema if needed.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("sessions.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            CoreError::Store(StoreError::OpenFailed {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        let store = Self { conn };
        store.migrate().map_err(StoreError::from)?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let store = Self { conn };
        store.migrate().map_err(StoreError::from)?;
        Ok(store)
    }

    fn migrate(&self) -> std::result::Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id          TEXT PRIMARY KEY,
                block_type  TEXT NOT NULL,
                started_at  TEXT NOT NULL,
                ended_at    TEXT
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);",
        )
    }

    /// Get a value from the kv store. Hosts use this to persist engine
    /// state between invocations.
    pub fn kv_get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn row_to_session(row: &rusqlite::Row<'_>) -> std::result::Result<Session, rusqlite::Error> {
        let id: String = row.get(0)?;
        let block_type: String = row.get(1)?;
        let started_at: String = row.get(2)?;
        let ended_at: Option<String> = row.get(3)?;

        let parse_ts = |s: &str, idx: usize| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
                })
        };

        Ok(Session {
            id: Uuid::parse_str(&id).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })?,
            block_type: BlockType::from_str_opt(&block_type).unwrap_or(BlockType::Focus),
            started_at: parse_ts(&started_at, 2)?,
            ended_at: ended_at.as_deref().map(|s| parse_ts(s, 3)).transpose()?,
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn create(&self, session: &Session) -> std::result::Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO sessions (id, block_type, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.to_string(),
                session.block_type.as_str(),
                session.started_at.to_rfc3339(),
                session.ended_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn close(&self, id: Uuid, ended_at: DateTime<Utc>) -> std::result::Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE sessions SET ended_at = ?2 WHERE id = ?1",
            params![id.to_string(), ended_at.to_rfc3339()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn list(&self) -> std::result::Result<Vec<Session>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, block_type, started_at, ended_at
             FROM sessions
             ORDER BY started_at DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_session)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    fn delete(&self, id: Uuid) -> std::result::Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
