//! SQLite persistence for searchsim-sink.
//!
//! One row per accepted event. The full received document is kept as JSON in
//! `payload`; the indexed columns exist only for counting and listing.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags};
use searchsim_tracking_protocol::{RecentEvent, TrackingEvent};
use serde_json::Value;
use std::path::PathBuf;

pub struct Db {
    path: PathBuf,
}

impl Db {
    pub fn new(path: PathBuf) -> Result<Self, String> {
        let db = Self { path };
        db.init_schema()?;
        Ok(db)
    }

    /// Stores `document` for a validated event. Returns the new row id.
    pub fn insert_event(
        &self,
        event: &TrackingEvent,
        document: &Value,
        created_at: DateTime<Utc>,
    ) -> Result<String, String> {
        self.with_connection(|conn| {
            let payload = serde_json::to_string(document)
                .map_err(|err| format!("Failed to serialize event document: {}", err))?;

            conn.execute(
                "INSERT INTO events \
                    (event_type, persona, session_id, recorded_at, created_at, payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.event_type.as_str(),
                    event.persona,
                    event.session_id,
                    format_timestamp(event.timestamp),
                    format_timestamp(created_at),
                    payload
                ],
            )
            .map_err(|err| format!("Failed to insert event: {}", err))?;

            Ok(conn.last_insert_rowid().to_string())
        })
    }

    pub fn count_events(&self) -> Result<u64, String> {
        let count = self.with_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM events", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|err| format!("Failed to count events: {}", err))
        })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Newest first, by insertion order.
    pub fn recent_events(&self, limit: usize) -> Result<Vec<RecentEvent>, String> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, event_type, persona, recorded_at, created_at \
                     FROM events ORDER BY id DESC LIMIT ?1",
                )
                .map_err(|err| format!("Failed to prepare recent events query: {}", err))?;

            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok(RecentEvent {
                        id: row.get::<_, i64>(0)?.to_string(),
                        event_type: row.get(1)?,
                        persona: row.get(2)?,
                        timestamp: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .map_err(|err| format!("Failed to read event rows: {}", err))?;

            let mut events = Vec::new();
            for row in rows {
                events.push(row.map_err(|err| format!("Failed to decode event row: {}", err))?);
            }
            Ok(events)
        })
    }

    #[cfg(test)]
    pub fn document(&self, id: &str) -> Result<Option<Value>, String> {
        use rusqlite::OptionalExtension;

        self.with_connection(|conn| {
            let payload: Option<String> = conn
                .query_row(
                    "SELECT payload FROM events WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| format!("Failed to query event document: {}", err))?;
            payload
                .map(|payload| {
                    serde_json::from_str(&payload)
                        .map_err(|err| format!("Failed to parse event document: {}", err))
                })
                .transpose()
        })
    }

    fn init_schema(&self) -> Result<(), String> {
        self.with_connection(|conn| {
            conn.execute_batch(
                "BEGIN;
                 CREATE TABLE IF NOT EXISTS events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    event_type TEXT NOT NULL,
                    persona TEXT NOT NULL,
                    session_id TEXT,
                    recorded_at TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    payload TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_events_persona ON events(persona);
                 CREATE INDEX IF NOT EXISTS idx_events_session ON events(session_id);
                 COMMIT;",
            )
            .map_err(|err| format!("Failed to initialize schema: {}", err))
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, String>,
    ) -> Result<T, String> {
        let mut conn = self.open()?;
        op(&mut conn)
    }

    fn open(&self) -> Result<Connection, String> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|err| format!("Failed to create sink data dir: {}", err))?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let conn = Connection::open_with_flags(&self.path, flags)
            .map_err(|err| format!("Failed to open sqlite db: {}", err))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| format!("Failed to enable WAL: {}", err))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|err| format!("Failed to set synchronous: {}", err))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|err| format!("Failed to set busy_timeout: {}", err))?;

        Ok(conn)
    }
}

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
