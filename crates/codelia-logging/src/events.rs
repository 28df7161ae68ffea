use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Which version of a requirement is being scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTarget {
    Original,
    Improved,
}

impl ScoreTarget {
    fn label(&self) -> &'static str {
        match self {
            ScoreTarget::Original => "ORIGINAL",
            ScoreTarget::Improved => "IMPROVED",
        }
    }
}

/// Structured log events for the evaluate/improve workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    EvaluationStarted {
        target: ScoreTarget,
        provider: String,
        requirement_preview: String,
    },
    EvaluationCompleted {
        target: ScoreTarget,
        total: u32,
        max: u32,
        percentage: f64,
    },
    EvaluationDegraded {
        target: ScoreTarget,
        reason: String,
    },
    RewriteStarted {
        provider: String,
        pattern: String,
    },
    RewriteCompleted {
        improved_preview: String,
        duration_secs: f64,
    },
    ComparisonCompleted {
        total_improvement: i64,
        top_rules: Vec<String>,
        duration_secs: f64,
    },
    HistorySaved {
        session_id: String,
        records: usize,
    },
    ServerStarted {
        address: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines
    Json,
    /// Single-line
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Renders workflow events on stderr, optionally mirrored to a JSON-lines file
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger that also appends every event to `log_path`
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // The file always gets JSON, whatever the console format.
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let _ = writeln!(file, "{}", event.with_timestamp());
            }
        }

        let mut stderr = std::io::stderr();
        match self.format {
            LogFormat::Json => {
                if let Ok(json) = serde_json::to_string(event) {
                    let _ = writeln!(stderr, "{}", json);
                }
            }
            LogFormat::Pretty => {
                let _ = writeln!(stderr, "{}", render_pretty(event));
            }
            LogFormat::Compact => {
                let timestamp = chrono::Utc::now().format("%H:%M:%S");
                let _ = writeln!(stderr, "[{}] {}", timestamp, render_compact(event));
            }
        }
    }
}

fn render_pretty(event: &LogEvent) -> String {
    match event {
        LogEvent::EvaluationStarted {
            target,
            provider,
            requirement_preview,
        } => format!(
            "  {} {} {} {}",
            "▶".bright_cyan(),
            format!("SCORE {}", target.label()).bright_cyan().bold(),
            format!("via {}:", provider).dimmed(),
            preview(requirement_preview, 60).dimmed()
        ),
        LogEvent::EvaluationCompleted {
            total,
            max,
            percentage,
            ..
        } => format!(
            "    {} {}/{} ({:.1}%)",
            "✓".bright_green(),
            total,
            max,
            percentage
        ),
        LogEvent::EvaluationDegraded { reason, .. } => format!(
            "    {} Scoring failed, using zero report: {}",
            "⚠".bright_yellow(),
            reason.bright_yellow()
        ),
        LogEvent::RewriteStarted { provider, pattern } => format!(
            "  {} {} {}",
            "▶".bright_magenta(),
            "REWRITE".bright_magenta().bold(),
            format!("via {} ({} pattern)", provider, pattern).dimmed()
        ),
        LogEvent::RewriteCompleted {
            improved_preview,
            duration_secs,
        } => format!(
            "    {} Done ({:.1}s) {}",
            "✓".bright_green(),
            duration_secs,
            preview(improved_preview, 60).dimmed()
        ),
        LogEvent::ComparisonCompleted {
            total_improvement,
            top_rules,
            duration_secs,
        } => {
            let delta = format!("{:+}", total_improvement);
            let delta = if *total_improvement > 0 {
                delta.bright_green()
            } else if *total_improvement < 0 {
                delta.bright_red()
            } else {
                delta.normal()
            };
            let top = if top_rules.is_empty() {
                "none".to_string()
            } else {
                top_rules.join(", ")
            };
            format!(
                "{} Total change {} in {:.1}s, top rules: {}",
                "●".bright_blue(),
                delta,
                duration_secs,
                top
            )
        }
        LogEvent::HistorySaved {
            session_id,
            records,
        } => format!(
            "{} Saved {} {} (session {})",
            "✓".bright_green(),
            records,
            if *records == 1 { "record" } else { "records" },
            session_id.dimmed()
        ),
        LogEvent::ServerStarted { address } => format!(
            "{} {} listening on {}",
            "●".bright_blue(),
            "codelia".bold().bright_white(),
            format!("http://{}", address).underline()
        ),
    }
}

fn render_compact(event: &LogEvent) -> String {
    match event {
        LogEvent::EvaluationStarted {
            target, provider, ..
        } => format!("score:{}:start {}", target.label().to_lowercase(), provider),
        LogEvent::EvaluationCompleted {
            target,
            total,
            max,
            ..
        } => format!("score:{}:done {}/{}", target.label().to_lowercase(), total, max),
        LogEvent::EvaluationDegraded { target, reason } => {
            format!("score:{}:degraded {}", target.label().to_lowercase(), reason)
        }
        LogEvent::RewriteStarted { pattern, .. } => format!("rewrite:start {}", pattern),
        LogEvent::RewriteCompleted { duration_secs, .. } => {
            format!("rewrite:done {:.1}s", duration_secs)
        }
        LogEvent::ComparisonCompleted {
            total_improvement,
            top_rules,
            ..
        } => format!(
            "compare:done {:+} [{}]",
            total_improvement,
            top_rules.join(",")
        ),
        LogEvent::HistorySaved {
            session_id,
            records,
        } => format!("history:saved {} {}", records, session_id),
        LogEvent::ServerStarted { address } => format!("server:start {}", address),
    }
}

/// First `max_chars` characters on one line, with an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = LogEvent::EvaluationCompleted {
            target: ScoreTarget::Improved,
            total: 200,
            max: 320,
            percentage: 62.5,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "evaluation_completed");
        assert_eq!(value["target"], "improved");
        assert_eq!(value["total"], 200);
    }

    #[test]
    fn test_compact_rendering() {
        let line = render_compact(&LogEvent::ComparisonCompleted {
            total_improvement: 12,
            top_rules: vec!["R3".to_string(), "P1".to_string()],
            duration_secs: 3.2,
        });
        assert_eq!(line, "compare:done +12 [R3,P1]");

        let degraded = render_compact(&LogEvent::EvaluationDegraded {
            target: ScoreTarget::Original,
            reason: "timeout".to_string(),
        });
        assert_eq!(degraded, "score:original:degraded timeout");
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("The pump\n  shall stop.", 40), "The pump shall stop.");
        assert_eq!(preview("abcdefghij", 8), "abcde...");
        assert_eq!(preview("요구사항 문장입니다", 5), "요구...");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_file_mirror_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        logger.log(&LogEvent::HistorySaved {
            session_id: "abc".to_string(),
            records: 2,
        });
        logger.log(&LogEvent::ServerStarted {
            address: "127.0.0.1:8000".to_string(),
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "history_saved");
        assert!(lines[0]["timestamp"].is_string());
    }
}
