use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use codelia_core::{AnalysisService, ImproveOutcome};
use codelia_db::SaveRequest;
use codelia_logging::{LogEvent, Logger};
use codelia_scoring::{Evaluation, PatternData, ScoreReport, CATEGORIES};

use crate::history::open_database;

/// Where the requirement text comes from
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Requirement text (reads stdin when neither --text nor --file is given)
    #[arg(short, long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the requirement from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    fn read(&self) -> Result<String> {
        if let Some(ref text) = self.text {
            return Ok(text.clone());
        }
        if let Some(ref path) = self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()));
        }

        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read requirement from stdin")?;
        Ok(text)
    }
}

pub struct ImproveArgs {
    pub input: InputArgs,
    pub pattern: String,
    pub fields: Vec<String>,
    pub save: bool,
    pub parent_id: String,
}

/// Build pattern data from `--pattern` and repeated `--field key=value`
pub fn pattern_data(pattern: &str, fields: &[String]) -> Result<PatternData> {
    let mut data = PatternData::new(pattern);
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .with_context(|| format!("Invalid --field '{}': expected key=value", field))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Invalid --field '{}': empty key", field);
        }
        data = data.with_field(key, value.trim());
    }
    Ok(data)
}

pub async fn handle_evaluate_command(
    service: &AnalysisService,
    input: InputArgs,
    json: bool,
) -> Result<()> {
    let text = input.read()?;
    let evaluation = service.evaluate(&text).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_evaluation("Score", &evaluation);
    }
    Ok(())
}

pub async fn handle_improve_command(
    service: &AnalysisService,
    args: ImproveArgs,
    db_path: Option<&Path>,
    logger: &Logger,
    json: bool,
) -> Result<()> {
    let text = args.input.read()?;
    let pattern = pattern_data(&args.pattern, &args.fields)?;
    let outcome = service.improve(&text, &pattern).await?;

    if args.save {
        let request = SaveRequest {
            original_text: text.trim().to_string(),
            improved_text: outcome.improved_result.improved.clone(),
            original_score: Some(i64::from(outcome.original_scores.report().total)),
            improved_score: Some(i64::from(outcome.improved_scores.report().total)),
            parent_id: args.parent_id,
            full_data: Some(serde_json::to_value(&outcome)?),
        };

        let db = open_database(db_path)?;
        let saved = db
            .history()
            .save_session(&request)
            .context("Failed to save history")?;
        logger.log(&LogEvent::HistorySaved {
            session_id: saved.session_id.clone(),
            records: saved.ids.len(),
        });

        if !json {
            eprintln!(
                "{} {}",
                "Saved:".green().bold(),
                saved.req_ids.join(", ")
            );
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_evaluation(title: &str, evaluation: &Evaluation) {
    let report = evaluation.report();
    println!(
        "{} {}/{} ({:.1}%)",
        format!("{}:", title).bold(),
        report.total,
        report.max,
        report.percentage
    );

    if let Evaluation::Degraded { reason, .. } = evaluation {
        println!("  {} {}", "scoring degraded:".yellow(), reason);
        return;
    }
    if !report.has_scores() {
        println!("  {}", "no rule scores returned".dimmed());
        return;
    }
    print_categories(report);
}

fn print_categories(report: &ScoreReport) {
    for category in CATEGORIES.iter() {
        if let Some(subtotal) = report.categories.get(category.name) {
            let line = format!(
                "  {:<45} {:>3}/{:<3}",
                category.name, subtotal.score, subtotal.max
            );
            if subtotal.score == subtotal.max {
                println!("{}", line.green());
            } else if subtotal.score * 2 < subtotal.max {
                println!("{}", line.red());
            } else {
                println!("{}", line);
            }
        }
    }
}

fn print_outcome(outcome: &ImproveOutcome) {
    print_evaluation("Original", &outcome.original_scores);
    println!();

    println!("{}", "Improved requirement:".bold());
    println!("{}", outcome.improved_result.improved);
    println!();

    print_evaluation("Improved", &outcome.improved_scores);
    println!();

    let delta = outcome.comparison.total_improvement;
    let delta_text = format!("{:+}", delta);
    let delta_text = if delta > 0 {
        delta_text.green()
    } else if delta < 0 {
        delta_text.red()
    } else {
        delta_text.dimmed()
    };
    println!("{} {}", "Total improvement:".bold(), delta_text);

    if !outcome.explanations.is_empty() {
        println!("{}", "Top improvements:".bold());
        for explanation in &outcome.explanations {
            let change = outcome
                .comparison
                .changes
                .get(&explanation.rule_id)
                .map(|c| c.change)
                .unwrap_or(0);
            println!(
                "  {} {} ({:+}): {}",
                explanation.rule_id.cyan(),
                explanation.name,
                change,
                explanation.reason.dimmed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_data_from_fields() {
        let fields = vec![
            "trigger=overpressure is detected".to_string(),
            "system_response = stop the pump ".to_string(),
        ];
        let data = pattern_data("event-driven", &fields).unwrap();

        assert_eq!(data.pattern(), "event-driven");
        let labeled = data.labeled_fields();
        assert!(labeled.contains(&("Trigger".to_string(), "overpressure is detected".to_string())));
        assert!(labeled.contains(&("System Response".to_string(), "stop the pump".to_string())));
    }

    #[test]
    fn test_pattern_data_rejects_malformed_fields() {
        assert!(pattern_data("ubiquitous", &["no-equals".to_string()]).is_err());
        assert!(pattern_data("ubiquitous", &["=value".to_string()]).is_err());
    }

    #[test]
    fn test_value_may_contain_equals() {
        let data = pattern_data("ubiquitous", &["condition=a=b".to_string()]).unwrap();
        assert_eq!(
            data.labeled_fields(),
            vec![("Condition".to_string(), "a=b".to_string())]
        );
    }
}
