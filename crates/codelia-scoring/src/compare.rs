use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::RULE_IDS;
use crate::ScoreReport;

/// How many rule improvements are explained after a rewrite
pub const TOP_IMPROVEMENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChange {
    pub original: u32,
    pub improved: u32,
    pub change: i64,
}

/// Per-rule score changes between an original requirement and its rewrite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub original: ScoreReport,
    pub improved: ScoreReport,
    pub changes: BTreeMap<String, RuleChange>,
    pub total_improvement: i64,
}

/// A rule that scored better after the rewrite, with the model's reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub rule_id: String,
    pub name: String,
    pub reason: String,
}

/// Compare two reports over all 63 canonical rules.
pub fn compare(original: &ScoreReport, improved: &ScoreReport) -> ComparisonReport {
    let changes = RULE_IDS
        .iter()
        .map(|id| {
            let before = original.score_of(id);
            let after = improved.score_of(id);
            (
                id.to_string(),
                RuleChange {
                    original: before,
                    improved: after,
                    change: after as i64 - before as i64,
                },
            )
        })
        .collect();

    ComparisonReport {
        original: original.clone(),
        improved: improved.clone(),
        changes,
        total_improvement: improved.total as i64 - original.total as i64,
    }
}

/// The rules that improved the most, largest gain first.
///
/// A rule qualifies only when both reports scored it and the rewrite scored
/// higher. Ties keep canonical rule order.
pub fn top_improvements(
    original: &ScoreReport,
    improved: &ScoreReport,
    limit: usize,
) -> Vec<Explanation> {
    let mut gains: Vec<(&str, i64)> = RULE_IDS
        .iter()
        .filter_map(|id| {
            let before = original.scores.get(*id)?;
            let after = improved.scores.get(*id)?;
            (after.score > before.score).then(|| (*id, after.score as i64 - before.score as i64))
        })
        .collect();

    // Stable sort keeps canonical order among equal gains.
    gains.sort_by_key(|(_, gain)| Reverse(*gain));

    gains
        .into_iter()
        .take(limit)
        .map(|(id, _)| {
            let before = &original.scores[id];
            let after = &improved.scores[id];
            Explanation {
                rule_id: id.to_string(),
                name: before
                    .name
                    .clone()
                    .or_else(|| after.name.clone())
                    .unwrap_or_else(|| id.to_string()),
                reason: after.reason.clone().unwrap_or_default(),
            }
        })
        .collect()
}
