//! Database layer for codelia.
//!
//! `Database` owns the SQLite connection and hands out the history store.

mod history;

pub use history::{
    split_requirements, History, HistoryRecord, NewHistoryItem, RequirementSection, SaveRequest,
    SavedSession,
};

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

/// The main database struct that owns the SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at the default location,
    /// `<data_local_dir>/codelia/history.db`.
    pub fn open() -> Result<Self, rusqlite::Error> {
        let db_path = Self::default_path();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        Self::open_at(&db_path)
    }

    /// Open or create a database at a specific path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codelia")
            .join("history.db")
    }

    /// Access the history store.
    pub fn history(&self) -> History<'_> {
        let conn = self.conn.lock().expect("Database lock poisoned");
        History::new(conn)
    }

    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                req_id TEXT NOT NULL,
                original_text TEXT,
                improved_text TEXT,
                original_score INTEGER,
                improved_score INTEGER,
                session_id TEXT,
                full_data TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_req_id ON history(req_id);
            CREATE INDEX IF NOT EXISTS idx_history_session_id ON history(session_id);
            "#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(req_id: &str) -> NewHistoryItem {
        NewHistoryItem {
            req_id: req_id.to_string(),
            original_text: Some("pump stops".to_string()),
            improved_text: Some("The pump shall stop.".to_string()),
            original_score: Some(120),
            improved_score: Some(210),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_list() {
        let db = Database::open_in_memory().unwrap();

        let second = db.history().save(&item("REQ-002")).unwrap();
        let first = db.history().save(&item("REQ-001")).unwrap();
        assert_ne!(first, second);

        let records = db.history().list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].req_id, "REQ-001");
        assert_eq!(records[0].improved_score, Some(210));
        assert_eq!(records[1].id, second);
    }

    #[test]
    fn test_delete_and_clear() {
        let db = Database::open_in_memory().unwrap();
        let id = db.history().save(&item("REQ-001")).unwrap();
        db.history().save(&item("REQ-002")).unwrap();

        assert!(db.history().delete(id).unwrap());
        assert!(!db.history().delete(id).unwrap());
        assert_eq!(db.history().list().unwrap().len(), 1);

        assert_eq!(db.history().clear().unwrap(), 1);
        assert!(db.history().list().unwrap().is_empty());
    }

    #[test]
    fn test_save_session_splits_and_groups() {
        let db = Database::open_in_memory().unwrap();
        let request = SaveRequest {
            original_text: "pump stops and alarm sounds".to_string(),
            improved_text: "**Requirement 1**\nThe pump shall stop.\n**Requirement 2**\nThe panel shall sound an alarm.".to_string(),
            original_score: Some(90),
            improved_score: Some(240),
            parent_id: "SYS-010".to_string(),
            full_data: Some(json!({"comparison": {"total_improvement": 150}})),
        };

        let saved = db.history().save_session(&request).unwrap();
        assert_eq!(saved.req_ids, vec!["SYS-010-001", "SYS-010-002"]);
        assert_eq!(saved.ids.len(), 2);

        let rows = db.history().list_session(&saved.session_id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].original_text.as_deref(),
            Some("pump stops and alarm sounds")
        );
        assert_eq!(
            rows[1].original_text.as_deref(),
            Some("(Original truncated - See SYS)")
        );
        assert_eq!(rows[1].improved_text.as_deref(), Some("The panel shall sound an alarm."));
        assert!(rows.iter().all(|r| r.improved_score == Some(240)));

        let full: serde_json::Value =
            serde_json::from_str(rows[0].full_data.as_deref().unwrap()).unwrap();
        assert_eq!(full["comparison"]["total_improvement"], 150);
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let db = Database::open_in_memory().unwrap();
        let request = SaveRequest {
            original_text: "x".to_string(),
            improved_text: "The pump shall stop.".to_string(),
            ..Default::default()
        };

        let a = db.history().save_session(&request).unwrap();
        let b = db.history().save_session(&request).unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.req_ids, vec!["REQ-001"]);
    }

    #[test]
    fn test_open_at_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let db = Database::open_at(&path).unwrap();
            db.history().save(&item("REQ-001")).unwrap();
        }
        let reopened = Database::open_at(&path).unwrap();
        assert_eq!(reopened.history().list().unwrap().len(), 1);
    }
}
