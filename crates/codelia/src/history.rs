use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use codelia_db::{Database, HistoryRecord};

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List saved requirements
    List {
        /// Only rows saved together in this session
        #[arg(long)]
        session: Option<String>,
    },

    /// Delete one saved requirement
    Delete {
        /// Row id as shown by `history list`
        id: i64,
    },

    /// Delete every saved requirement
    Clear,
}

/// Open the history database at `path`, or the default location
pub fn open_database(path: Option<&Path>) -> Result<Database> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create {}", parent.display())
                    })?;
                }
            }
            Database::open_at(path)
                .with_context(|| format!("Failed to open database {}", path.display()))
        }
        None => Database::open().context("Failed to initialize database"),
    }
}

pub fn handle_history_command(db_path: Option<&Path>, action: HistoryAction, json: bool) -> Result<()> {
    let db = open_database(db_path)?;

    match action {
        HistoryAction::List { session } => {
            let records = match session {
                Some(ref id) => db.history().list_session(id)?,
                None => db.history().list()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("{}", "No saved requirements.".dimmed());
            } else {
                print_history_table(&records);
            }
        }
        HistoryAction::Delete { id } => {
            let deleted = db.history().delete(id)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else if deleted {
                println!("Deleted {}", id);
            } else {
                anyhow::bail!("No history entry with id {}", id);
            }
        }
        HistoryAction::Clear => {
            let removed = db.history().clear()?;
            if json {
                println!("{}", serde_json::json!({ "deleted": removed }));
            } else {
                println!("Removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" });
            }
        }
    }

    Ok(())
}

fn print_history_table(records: &[HistoryRecord]) {
    println!(
        "{:<6} {:<16} {:<16} {:<9} {}",
        "ID".dimmed(),
        "REQ ID".dimmed(),
        "SAVED".dimmed(),
        "SCORE".dimmed(),
        "REQUIREMENT".dimmed(),
    );

    for record in records {
        let score = match (record.original_score, record.improved_score) {
            (Some(before), Some(after)) => format!("{}→{}", before, after),
            (None, Some(after)) => after.to_string(),
            _ => "-".to_string(),
        };
        let text = record
            .improved_text
            .as_deref()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("");
        let text = if text.chars().count() > 60 {
            format!("{}...", text.chars().take(60).collect::<String>())
        } else {
            text.to_string()
        };

        println!(
            "{:<6} {:<16} {:<16} {:<9} {}",
            record.id,
            record.req_id.cyan(),
            record.created_at.format("%Y-%m-%d %H:%M"),
            score,
            text
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codelia_db::NewHistoryItem;

    #[test]
    fn test_open_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        let db = open_database(Some(&path)).unwrap();
        db.history()
            .save(&NewHistoryItem {
                req_id: "REQ-001".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_delete_missing_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        let err = handle_history_command(Some(&path), HistoryAction::Delete { id: 42 }, false)
            .unwrap_err();
        assert!(err.to_string().contains("42"));

        handle_history_command(Some(&path), HistoryAction::Clear, true).unwrap();
    }
}
