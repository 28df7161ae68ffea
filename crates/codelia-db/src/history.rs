//! History store for saved evaluate/improve results.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::MutexGuard;
use uuid::Uuid;

lazy_static! {
    /// `**Requirement 2**`, `**Requirement 2 (Braking)**` or `**요구사항 2**`
    static ref REQUIREMENT_HEADER: Regex =
        Regex::new(r"\*\*(?:Requirement|요구사항)\s+(\d+).*?\*\*").expect("valid header pattern");
}

const DEFAULT_REQ_ID: &str = "REQ-001";
const DEFAULT_PADDING: usize = 3;

/// A stored history row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub req_id: String,
    pub original_text: Option<String>,
    pub improved_text: Option<String>,
    pub original_score: Option<i64>,
    pub improved_score: Option<i64>,
    pub session_id: Option<String>,
    /// JSON text of the full analysis result
    pub full_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row to insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryItem {
    pub req_id: String,
    pub original_text: Option<String>,
    pub improved_text: Option<String>,
    pub original_score: Option<i64>,
    pub improved_score: Option<i64>,
    pub session_id: Option<String>,
    pub full_data: Option<String>,
}

/// One analysis result to be split into per-requirement rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub improved_text: String,
    #[serde(default)]
    pub original_score: Option<i64>,
    #[serde(default)]
    pub improved_score: Option<i64>,
    /// Requirement id the rows are numbered under, e.g. `SYS-010`
    #[serde(default)]
    pub parent_id: String,
    /// Complete analysis response; stored as JSON text
    #[serde(default)]
    pub full_data: Option<Value>,
}

/// Rows written by one [`History::save_session`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub session_id: String,
    pub ids: Vec<i64>,
    pub req_ids: Vec<String>,
}

/// One requirement cut out of an improved text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSection {
    pub req_id: String,
    pub text: String,
}

/// Split an improved text into individually numbered requirements.
///
/// Bold `Requirement N` headers delimit sections; anything before the first
/// header is dropped. Each section is cut at its first `\n###` heading.
/// Without headers the whole text is one requirement.
pub fn split_requirements(improved_text: &str, parent_id: &str) -> Vec<RequirementSection> {
    let parent_id = parent_id.trim();
    let numbers: Vec<&str> = REQUIREMENT_HEADER
        .captures_iter(improved_text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if numbers.is_empty() {
        let req_id = if parent_id.is_empty() {
            DEFAULT_REQ_ID
        } else {
            parent_id
        };
        return vec![RequirementSection {
            req_id: req_id.to_string(),
            text: display_text(improved_text),
        }];
    }

    let padding = trailing_digits(parent_id)
        .map(str::len)
        .unwrap_or(DEFAULT_PADDING);

    let mut seen = HashSet::new();
    let mut sections = Vec::new();
    for (number, body) in numbers
        .iter()
        .zip(REQUIREMENT_HEADER.split(improved_text).skip(1))
    {
        let number = format!("{:0>width$}", number, width = padding);
        let req_id = if parent_id.is_empty() {
            format!("REQ-{}", number)
        } else if parent_id.ends_with(&format!("-{}", number))
            || parent_id.ends_with(&format!(" {}", number))
        {
            parent_id.to_string()
        } else {
            format!("{}-{}", parent_id, number)
        };

        // Models sometimes repeat a header.
        if !seen.insert(req_id.clone()) {
            continue;
        }
        sections.push(RequirementSection {
            req_id,
            text: display_text(body),
        });
    }
    sections
}

fn display_text(text: &str) -> String {
    text.split("\n###").next().unwrap_or_default().trim().to_string()
}

fn trailing_digits(id: &str) -> Option<&str> {
    let start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some(&id[start..])
}

fn full_data_text(value: &Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    }
}

const SELECT_COLUMNS: &str = "SELECT id, req_id, original_text, improved_text, original_score, improved_score, session_id, full_data, created_at FROM history";

/// History store with a borrowed connection.
pub struct History<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> History<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Insert a row, returning its id.
    pub fn save(&self, item: &NewHistoryItem) -> Result<i64, rusqlite::Error> {
        insert(&self.conn, item)
    }

    /// Split `request.improved_text` into requirements and store one row per
    /// requirement, all sharing a fresh session id.
    ///
    /// Only the first row keeps the original text; later rows point back to
    /// the first requirement's id prefix.
    pub fn save_session(&self, request: &SaveRequest) -> Result<SavedSession, rusqlite::Error> {
        let session_id = Uuid::new_v4().to_string();
        let full_data = full_data_text(&request.full_data);
        let sections = split_requirements(&request.improved_text, &request.parent_id);

        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(sections.len());
        let mut req_ids = Vec::with_capacity(sections.len());

        for (index, section) in sections.into_iter().enumerate() {
            let original_text = if index == 0 {
                request.original_text.clone()
            } else {
                let prefix = section.req_id.split('-').next().unwrap_or_default();
                format!("(Original truncated - See {})", prefix)
            };

            let item = NewHistoryItem {
                req_id: section.req_id.clone(),
                original_text: Some(original_text),
                improved_text: Some(section.text),
                original_score: request.original_score,
                improved_score: request.improved_score,
                session_id: Some(session_id.clone()),
                full_data: full_data.clone(),
            };
            ids.push(insert(&tx, &item)?);
            req_ids.push(section.req_id);
        }
        tx.commit()?;

        Ok(SavedSession {
            session_id,
            ids,
            req_ids,
        })
    }

    /// All rows, by requirement id then newest first.
    pub fn list(&self) -> Result<Vec<HistoryRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY req_id ASC, created_at DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Rows written by one save.
    pub fn list_session(&self, session_id: &str) -> Result<Vec<HistoryRecord>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE session_id = ?1 ORDER BY id ASC", SELECT_COLUMNS))?;
        let rows = stmt.query_map(params![session_id], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Delete a row by id.
    pub fn delete(&self, id: i64) -> Result<bool, rusqlite::Error> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM history WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    /// Delete every row, returning how many were removed.
    pub fn clear(&self) -> Result<usize, rusqlite::Error> {
        self.conn.execute("DELETE FROM history", [])
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<HistoryRecord, rusqlite::Error> {
        let created_at_str: String = row.get(8)?;

        Ok(HistoryRecord {
            id: row.get(0)?,
            req_id: row.get(1)?,
            original_text: row.get(2)?,
            improved_text: row.get(3)?,
            original_score: row.get(4)?,
            improved_score: row.get(5)?,
            session_id: row.get(6)?,
            full_data: row.get(7)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

fn insert(conn: &Connection, item: &NewHistoryItem) -> Result<i64, rusqlite::Error> {
    conn.execute(
        r#"
        INSERT INTO history (req_id, original_text, improved_text, original_score, improved_score, session_id, full_data, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            item.req_id,
            item.original_text,
            item.improved_text,
            item.original_score,
            item.improved_score,
            item.session_id,
            item.full_data,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
