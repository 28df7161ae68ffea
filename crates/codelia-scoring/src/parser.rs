use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::rules::{is_rule_code, MAX_RULE_SCORE};
use crate::RuleScore;

#[derive(Error, Debug)]
pub enum ScoreParseError {
    #[error("Failed to parse score JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
        raw_response: String,
    },

    #[error("Score response is not a JSON object")]
    NotAnObject { raw_response: String },
}

impl ScoreParseError {
    /// The model output that failed to parse
    pub fn raw_response(&self) -> &str {
        match self {
            ScoreParseError::InvalidJson { raw_response, .. }
            | ScoreParseError::NotAnObject { raw_response } => raw_response,
        }
    }
}

/// Extract the JSON document from a model response.
///
/// Models wrap their answer in markdown fences or surround it with prose, so
/// the fences are stripped and everything from the first `{` to the last `}`
/// is parsed. Without braces the whole trimmed text is tried.
pub fn extract_json(response: &str) -> Result<Value, ScoreParseError> {
    let mut clean = response.trim();
    if let Some(rest) = clean.strip_prefix("```json") {
        clean = rest;
    }
    if let Some(rest) = clean.strip_prefix("```") {
        clean = rest;
    }
    if let Some(rest) = clean.strip_suffix("```") {
        clean = rest;
    }

    let candidate = match (clean.find('{'), clean.rfind('}')) {
        (Some(start), Some(end)) if end > start => &clean[start..=end],
        _ => clean.trim(),
    };

    serde_json::from_str(candidate).map_err(|source| ScoreParseError::InvalidJson {
        source,
        raw_response: response.to_string(),
    })
}

/// Parse a scoring response into per-rule scores.
///
/// Keys that are not rule codes, and rule entries that are not objects, are
/// ignored. A document with no rule codes but a nested `scores` object is read
/// from that object instead.
pub fn parse_scores(response: &str) -> Result<BTreeMap<String, RuleScore>, ScoreParseError> {
    let document = extract_json(response)?;
    let Value::Object(map) = document else {
        return Err(ScoreParseError::NotAnObject {
            raw_response: response.to_string(),
        });
    };

    let has_rule_keys = map.keys().any(|k| is_rule_code(k));
    let source = match map.get("scores") {
        Some(Value::Object(nested)) if !has_rule_keys => nested,
        _ => &map,
    };

    let scores = collect_scores(source);
    debug!(
        response_len = response.len(),
        rules = scores.len(),
        "Parsed score response"
    );
    Ok(scores)
}

fn collect_scores(map: &Map<String, Value>) -> BTreeMap<String, RuleScore> {
    map.iter()
        .filter(|(key, _)| is_rule_code(key))
        .filter_map(|(key, value)| {
            let entry = value.as_object()?;
            Some((
                key.clone(),
                RuleScore {
                    score: entry.get("score").map(score_value).unwrap_or(0),
                    name: text_field(entry, "name"),
                    reason: text_field(entry, "reason"),
                },
            ))
        })
        .collect()
}

/// Coerce a score into 0..=5: floats are rounded, numeric strings parsed,
/// anything else counts as 0.
fn score_value(value: &Value) -> u32 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, MAX_RULE_SCORE as f64) as u32,
        _ => 0,
    }
}

fn text_field(entry: &Map<String, Value>, field: &str) -> Option<String> {
    match entry.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}
